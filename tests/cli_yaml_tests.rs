//! Event-file parsing and replay.

use fxdeleg_core::error::Error as CoreError;
use fxdeleg_telemetry::{parse_yaml_events, DelegationStatus, Error};

const ALL_EVENTS: &str = r#"
data_sources:
  - name: Accounts
  - name: Legacy
    kind: Connector
functions:
  - name: Filter
  - name: Rand
  - name: LookUp
events:
  - event: empty
  - event: binary_op_not_supported
    op: "<>"
  - event: unary_op_not_supported
    op: Not
  - event: data_source_not_delegatable
    data_source: Legacy
  - event: undelegatable_function
    function: LookUp
  - event: undelegatable_function
  - event: column_not_delegatable
    column: Owner
  - event: column_not_delegatable
    column: Price
    name_kind: LambdaField
  - event: impure_node
    node: { id: 7, expr: { call: { head: Rand } } }
    binding: { callee: Rand }
  - event: impure_node
    node: { expr: { call: { head: Rand } } }
    binding: { callee: null }
  - event: impure_node
    node: { expr: { call: { head: Now } } }
  - event: impure_node
    node: { expr: { num_lit: 3.5 } }
    binding: {}
  - event: delegation_successful
    data_source: Accounts
  - event: delegation_successful
  - event: unsupported_sort_arg
    node: { expr: { first_name: Price } }
    data_source: Accounts
  - event: invalid_arg_type
    arg_type: { kind: Guid }
    data_source: Accounts
"#;

#[test]
fn test_parse_every_event_kind() {
    let file = parse_yaml_events(ALL_EVENTS).unwrap();
    let events = file.events().unwrap();
    let got: Vec<_> = events
        .iter()
        .map(|e| (e.info.info(), e.info.data_source_name()))
        .collect();
    assert_eq!(
        got,
        vec![
            ("", None),
            ("NotEqual", None),
            ("Not", None),
            ("Legacy", None),
            ("LookUp", None),
            ("", None),
            ("Owner", None),
            ("Price", None),
            ("Rand", None),
            ("", None),
            ("Now()", None),
            ("3.5", None),
            ("", Some("Accounts")),
            ("", None),
            ("FirstName", Some("Accounts")),
            ("Guid", Some("Accounts")),
        ]
    );
}

#[test]
fn test_statuses_follow_event_kind() {
    let file = parse_yaml_events(ALL_EVENTS).unwrap();
    let events = file.events().unwrap();
    assert_eq!(events[1].status, DelegationStatus::BinaryOpNotSupported);
    assert_eq!(events[4].function.as_deref(), Some("LookUp"));
    assert_eq!(events[7].status, DelegationStatus::NoDelegationSupportByColumn);
    assert_eq!(events[8].node.map(|n| n.get()), Some(7));
    assert!(events[12].status.is_success());
}

#[test]
fn test_replay_is_deterministic() {
    let a = parse_yaml_events(ALL_EVENTS).unwrap().events().unwrap();
    let b = parse_yaml_events(ALL_EVENTS).unwrap().events().unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_undeclared_function_is_rejected() {
    let yaml = r#"
events:
  - event: impure_node
    node: { expr: { call: { head: Patch } } }
    binding: { callee: Patch }
"#;
    let file = parse_yaml_events(yaml).unwrap();
    assert!(matches!(file.events(), Err(Error::Core(CoreError::Resolve(_)))));
}

#[test]
fn test_unknown_event_kind_fails_parse() {
    let yaml = r#"
events:
  - event: teleport
"#;
    assert!(matches!(parse_yaml_events(yaml), Err(Error::Yaml(_))));
}

#[test]
fn test_config_block_is_carried() {
    let yaml = r#"
config:
  emit_successful: false
events: []
"#;
    let file = parse_yaml_events(yaml).unwrap();
    let cfg = file.config.unwrap();
    assert_eq!(cfg.emit_successful, Some(false));
    assert_eq!(cfg.enabled, None);
}
