//! In-memory stand-in for the account backend

use futures::future;
use roof_core::Value;
use tracing::debug;

struct UserRecord {
    username: &'static str,
    from: &'static str,
    password: &'static str,
    id: &'static str,
}

const USER_DB: [UserRecord; 2] = [
    UserRecord {
        username: "Lili",
        from: "USA",
        password: "123",
        id: "1",
    },
    UserRecord {
        username: "Jack",
        from: "Chinese",
        password: "123",
        id: "2",
    },
];

impl UserRecord {
    fn to_value(&self) -> Value {
        Value::map([
            ("username", self.username),
            ("from", self.from),
            ("id", self.id),
        ])
    }
}

/// Check credentials; usernames compare case-insensitively
pub async fn login(username: String, password: String) -> Value {
    // Stand-in for network latency
    future::ready(()).await;
    debug!(%username, "checking credentials");

    let found = USER_DB
        .iter()
        .find(|user| user.username.eq_ignore_ascii_case(&username) && user.password == password);
    match found {
        Some(user) => Value::map([("success", Value::Bool(true)), ("id", Value::from(user.id))]),
        None => Value::map([
            ("success", Value::Bool(false)),
            ("message", Value::from("login error")),
        ]),
    }
}

/// Public details of a user, without the password
pub async fn fetch_user_info(id: String) -> Option<Value> {
    future::ready(()).await;
    USER_DB.iter().find(|user| user.id == id).map(UserRecord::to_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_login() {
        let ok = block_on(login("lili".into(), "123".into()));
        assert_eq!(ok.as_map().unwrap()["id"], Value::from("1"));

        let bad = block_on(login("Lili".into(), "nope".into()));
        assert_eq!(bad.as_map().unwrap()["success"], Value::Bool(false));
    }

    #[test]
    fn test_fetch_user_info() {
        let info = block_on(fetch_user_info("2".into())).unwrap();
        assert_eq!(info.as_map().unwrap()["from"], Value::from("Chinese"));
        assert!(block_on(fetch_user_info("3".into())).is_none());
    }
}
