use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Import {
        path: String,
    },
    Schema {
        jurisdiction: String,
    },
    Queue {
        url: String,
        user_id: i32,
        jurisdiction: Option<String>,
    },
    Worker,
    Help,
    Unknown(String),
}

impl FromStr for AppCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(AppCommand::Help);
        }

        match parts[0] {
            "import" => match parts.get(1) {
                Some(path) => Ok(AppCommand::Import {
                    path: path.to_string(),
                }),
                None => Ok(AppCommand::Unknown("usage: import <file>".to_string())),
            },
            "schema" => match parts.get(1) {
                Some(code) => Ok(AppCommand::Schema {
                    jurisdiction: code.to_string(),
                }),
                None => Ok(AppCommand::Unknown("usage: schema <jurisdiction>".to_string())),
            },
            "queue" => {
                let url = parts.get(1);
                let user_id = parts.get(2).and_then(|s| s.parse::<i32>().ok());
                match (url, user_id) {
                    (Some(url), Some(user_id)) => Ok(AppCommand::Queue {
                        url: url.to_string(),
                        user_id,
                        jurisdiction: parts.get(3).map(|s| s.to_string()),
                    }),
                    _ => Ok(AppCommand::Unknown(
                        "usage: queue <url> <user_id> [jurisdiction]".to_string(),
                    )),
                }
            }
            "worker" | "workers" => Ok(AppCommand::Worker),
            "help" | "h" | "--help" => Ok(AppCommand::Help),
            other => Ok(AppCommand::Unknown(format!("unknown command: {}", other))),
        }
    }
}

pub const HELP: &str = "\
commands:
  import <file>                          import a survey definition (JSON)
  schema <jurisdiction>                  print the request schema for a jurisdiction
  queue <url> <user_id> [jurisdiction]   queue certificate generation for a documentation URL
  worker                                 run generation workers until interrupted
  help                                   show this message";
