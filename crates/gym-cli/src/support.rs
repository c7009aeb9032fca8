use gym_service::{Club, ClubConfig, ClubError, Session};
use serde_json::{Value, json};
use std::path::Path;

use crate::cli::Credentials;

/// Everything a command needs: the opened club and the output mode.
pub struct Ctx {
    pub club: Club,
    pub json: bool,
}

impl Ctx {
    /// Resolve configuration and open the club, exiting on failure.
    pub fn open_or_exit(store: Option<&Path>, config: Option<&Path>, json: bool) -> Self {
        let resolved = ClubConfig::load(config)
            .map_err(ClubError::from)
            .map(|c| match store {
                Some(path) => c.with_store_path(path),
                None => c,
            })
            .and_then(|c| Club::open(&c));
        match resolved {
            Ok(club) => Self { club, json },
            Err(err) => fail("config", &err, json),
        }
    }

    pub fn login_or_exit(&self, action: &str, auth: &Credentials) -> Session {
        self.or_exit(action, self.club.login(&auth.user, &auth.secret))
    }

    pub fn or_exit<T>(&self, action: &str, result: Result<T, ClubError>) -> T {
        result.unwrap_or_else(|err| fail(action, &err, self.json))
    }

    /// Print `payload` in JSON mode, `text` otherwise.
    pub fn emit(&self, action: &str, payload: Value, text: impl FnOnce() -> String) {
        if self.json {
            let mut payload = payload;
            if let Value::Object(map) = &mut payload {
                map.insert("action".to_string(), Value::String(action.to_string()));
                map.insert("ok".to_string(), Value::Bool(true));
            }
            print_json(&payload);
        } else {
            println!("{}", text());
        }
    }
}

fn fail(action: &str, err: &ClubError, json: bool) -> ! {
    if json {
        print_json(&json!({
            "action": action,
            "ok": false,
            "failureClass": err.failure_class(),
            "message": err.to_string(),
        }));
    } else {
        eprintln!("error: {err}");
    }
    std::process::exit(1);
}

fn print_json(payload: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(payload).expect("json serialization")
    );
}
