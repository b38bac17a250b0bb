//! Connection descriptor parsed from an ADO.NET-style connection string.
//!
//! `Server=tcp:db.example.net,1433;Initial Catalog=app;User Id=deploy;Password='p;w'`

use secrecy::{ExposeSecret, SecretString};

use crate::error::{DeployError, Result};

/// The addressing and credential fields the deployment tools need.
///
/// The full text is kept verbatim because sqlpackage receives it as
/// `/TargetConnectionString`. Both it and the password are secrets and never
/// show up in `Debug` output.
#[derive(Debug)]
pub struct ConnectionString {
    raw: SecretString,
    server: Option<String>,
    database: String,
    user_id: Option<String>,
    password: Option<SecretString>,
    /// The password as written in `raw`, quotes and doubled quotes included.
    password_source: Option<SecretString>,
    integrated_security: bool,
}

impl ConnectionString {
    pub fn parse(text: &str) -> Result<Self> {
        let mut server = None;
        let mut database = None;
        let mut user_id = None;
        let mut password = None;
        let mut password_source = None;
        let mut integrated_security = false;

        for Pair { key, value, source } in parse_pairs(text)? {
            match key.as_str() {
                "server" | "data source" | "address" | "addr" | "network address" => {
                    server = Some(value)
                }
                "database" | "initial catalog" => database = Some(value),
                "user id" | "uid" | "user" => user_id = Some(value),
                "password" | "pwd" => {
                    password = Some(SecretString::from(value));
                    password_source = Some(SecretString::from(source));
                }
                "integrated security" | "trusted_connection" => {
                    integrated_security =
                        matches!(value.to_ascii_lowercase().as_str(), "true" | "yes" | "sspi")
                }
                _ => {}
            }
        }

        let database = database.filter(|d| !d.is_empty()).ok_or_else(|| {
            DeployError::InvalidConnectionString("missing Database / Initial Catalog".into())
        })?;

        if !integrated_security {
            if user_id.as_deref().map_or(true, str::is_empty) {
                return Err(DeployError::InvalidConnectionString(
                    "missing User Id (or set Integrated Security=true)".into(),
                ));
            }
            if password.is_none() {
                return Err(DeployError::InvalidConnectionString(
                    "missing Password (or set Integrated Security=true)".into(),
                ));
            }
        }

        Ok(Self {
            raw: SecretString::from(text.to_string()),
            server,
            database,
            user_id,
            password,
            password_source,
            integrated_security,
        })
    }

    /// Server named in the connection string, if any.
    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn password(&self) -> Option<&SecretString> {
        self.password.as_ref()
    }

    /// The password exactly as it appears in the connection string text.
    /// Differs from [`Self::password`] when the value was quoted.
    pub fn password_source(&self) -> Option<&SecretString> {
        self.password_source.as_ref()
    }

    pub fn is_trusted(&self) -> bool {
        self.integrated_security
    }

    /// The full connection string exactly as supplied.
    pub fn expose_connection_string(&self) -> &str {
        self.raw.expose_secret()
    }
}

impl std::str::FromStr for ConnectionString {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

struct Pair {
    key: String,
    value: String,
    /// Value text as written, before unquoting.
    source: String,
}

/// Split `key=value;...` into lowercase keys and unquoted values.
/// Later duplicates win.
fn parse_pairs(text: &str) -> Result<Vec<Pair>> {
    let mut pairs = Vec::new();
    let mut chars = text.chars().peekable();

    loop {
        let mut key = String::new();
        let mut saw_eq = false;
        for c in chars.by_ref() {
            match c {
                '=' => {
                    saw_eq = true;
                    break;
                }
                ';' => break,
                _ => key.push(c),
            }
        }
        let key = key.trim().to_ascii_lowercase();

        if !saw_eq {
            if !key.is_empty() {
                return Err(DeployError::InvalidConnectionString(format!(
                    "segment '{key}' has no '='"
                )));
            }
            if chars.peek().is_none() {
                break;
            }
            continue;
        }
        if key.is_empty() {
            return Err(DeployError::InvalidConnectionString(
                "empty key before '='".into(),
            ));
        }

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        let mut source = String::new();
        match chars.peek().copied() {
            Some(quote @ ('\'' | '"')) => {
                chars.next();
                source.push(quote);
                loop {
                    match chars.next() {
                        None => {
                            return Err(DeployError::InvalidConnectionString(format!(
                                "unterminated quoted value for '{key}'"
                            )))
                        }
                        Some(c) if c == quote => {
                            source.push(quote);
                            if chars.peek() == Some(&quote) {
                                chars.next();
                                source.push(quote);
                                value.push(quote);
                            } else {
                                break;
                            }
                        }
                        Some(c) => {
                            source.push(c);
                            value.push(c);
                        }
                    }
                }
                for c in chars.by_ref() {
                    match c {
                        ';' => break,
                        c if c.is_whitespace() => {}
                        _ => {
                            return Err(DeployError::InvalidConnectionString(format!(
                                "unexpected text after quoted value for '{key}'"
                            )))
                        }
                    }
                }
            }
            _ => {
                for c in chars.by_ref() {
                    if c == ';' {
                        break;
                    }
                    value.push(c);
                }
                value = value.trim_end().to_string();
                source.clone_from(&value);
            }
        }

        pairs.push(Pair { key, value, source });
    }

    Ok(pairs)
}
