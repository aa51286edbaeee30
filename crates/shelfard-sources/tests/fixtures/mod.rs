//! Payload fixtures shared by the source tests

use serde_json::{json, Value};

/// A single user record as first observed
pub fn user_v1() -> Value {
    json!({
        "id": 1,
        "name": "Leanne Graham",
        "email": "leanne@example.com",
        "address": {
            "city": "Gwenborough",
            "zipcode": "92998-3874"
        },
        "tags": ["admin"]
    })
}

/// The same endpoint after a breaking release: `email` dropped, `id` became a string
pub fn user_v2() -> Value {
    json!({
        "id": "usr_1",
        "name": "Leanne Graham",
        "address": {
            "city": "Gwenborough",
            "zipcode": "92998-3874",
            "geo": {"lat": -37.3159, "lng": 81.1496}
        },
        "tags": ["admin"]
    })
}

/// A list endpoint whose records disagree on optional fields
pub fn user_list() -> Value {
    json!([
        {"id": 1, "name": "Leanne Graham", "phone": null},
        {"id": 2, "name": "Ervin Howell", "phone": "010-692-6593"}
    ])
}
