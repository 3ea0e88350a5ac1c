use common_token::{global, role_query, sign, SignOptions};
use serde_json::{json, Value};

// Process-wide state: keep every assertion in one test so nothing races.
#[test]
fn process_wide_session_round_trip() {
    assert!(global::token().is_none());
    assert_eq!(global::get_property("property", Value::Null), Value::Null);
    assert!(!global::has_role(&role_query!["ROLE_ADMINISTRATOR"]));

    let token = sign(
        &json!({ "property": 123, "roles": ["ROLE_ADMINISTRATOR", "ROLE_USER"] }),
        b"secret",
        &SignOptions::new(),
    )
    .expect("sign");
    assert!(global::is_valid(&token));

    global::set_token(token.clone());
    assert_eq!(global::token(), Some(token));
    assert_eq!(global::get_property("property", Value::Null), json!(123));
    assert!(global::has_role(&role_query![all: "ROLE_ADMINISTRATOR", "ROLE_USER"]));
    assert!(global::has_role(&role_query![
        ["ROLE_ADMINISTRATOR", "ROLE_DOES_NOT_EXIST"],
        ["ROLE_ADMINISTRATOR", "ROLE_USER"]
    ]));
    assert!(global::session().is_current_valid());

    global::clear_token();
    assert!(global::token().is_none());
    assert_eq!(global::get_property("property", json!("gone")), json!("gone"));
}
