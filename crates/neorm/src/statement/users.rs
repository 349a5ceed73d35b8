//! User administration statements (MySQL account management syntax).
//!
//! Grant, revoke and the other per-account statements act on a user context set by
//! [`Statement::create_user`] or [`Statement::for_user`]; it survives across statements built
//! on the same [`Statement`].

use super::{Statement, StatementKind, UserRef};
use crate::error::{OrmError, OrmResult};
use crate::value::quote_literal;

const ALLOWED_PRIVILEGES: &[&str] = &[
    "SELECT",
    "INSERT",
    "DELETE",
    "UPDATE",
    "CREATE",
    "DROP",
    "ALTER",
    "GRANT OPTION",
];

/// Privilege set for `GRANT` / `REVOKE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Privileges {
    /// `ALL PRIVILEGES`
    All,
    /// Free text: `all`, `*` or empty means all, otherwise whitespace-separated names.
    Text(String),
    /// Explicit privilege names.
    List(Vec<String>),
}

impl Privileges {
    /// Validate against the allow-list and render the privilege part of the statement.
    fn render(&self) -> OrmResult<String> {
        let names = match self {
            Privileges::All => return Ok("ALL PRIVILEGES".to_string()),
            Privileges::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() || trimmed == "*" || trimmed.eq_ignore_ascii_case("all") {
                    return Ok("ALL PRIVILEGES".to_string());
                }
                tokenize(trimmed)
            }
            Privileges::List(names) => names.iter().map(|n| n.trim().to_string()).collect(),
        };
        if names.is_empty() {
            return Err(OrmError::config("privilege list is empty"));
        }

        let mut rendered = Vec::with_capacity(names.len());
        for name in names {
            let upper = name.to_ascii_uppercase();
            if !ALLOWED_PRIVILEGES.contains(&upper.as_str()) {
                return Err(OrmError::config(format!(
                    "the privilege type '{name}' is not supported"
                )));
            }
            rendered.push(upper);
        }
        Ok(rendered.join(", "))
    }
}

/// Split on whitespace, keeping `GRANT OPTION` together.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut words = text.split_whitespace().peekable();
    while let Some(word) = words.next() {
        if word.eq_ignore_ascii_case("GRANT")
            && words
                .peek()
                .is_some_and(|next| next.eq_ignore_ascii_case("OPTION"))
        {
            words.next();
            tokens.push("GRANT OPTION".to_string());
        } else {
            tokens.push(word.to_string());
        }
    }
    tokens
}

impl From<&str> for Privileges {
    fn from(s: &str) -> Self {
        Privileges::Text(s.to_string())
    }
}

impl From<String> for Privileges {
    fn from(s: String) -> Self {
        Privileges::Text(s)
    }
}

impl From<Vec<&str>> for Privileges {
    fn from(v: Vec<&str>) -> Self {
        Privileges::List(v.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Privileges {
    fn from(v: Vec<String>) -> Self {
        Privileges::List(v)
    }
}

impl<const N: usize> From<[&str; N]> for Privileges {
    fn from(v: [&str; N]) -> Self {
        Privileges::List(v.iter().map(|s| s.to_string()).collect())
    }
}

impl UserRef {
    fn new(name: &str, scope: &str) -> Self {
        Self {
            name: name.to_string(),
            scope: scope.to_string(),
        }
    }

    /// `'name'@'scope'`
    fn account(&self) -> String {
        account(&self.name, &self.scope)
    }
}

fn account(name: &str, scope: &str) -> String {
    format!("{}@{}", quote_literal(name), quote_literal(scope))
}

impl Statement {
    /// Start `CREATE USER 'name'@'scope'` and make it the user context.
    pub fn create_user(&mut self, name: &str, scope: &str) -> &mut Self {
        let user = UserRef::new(name, scope);
        self.start(StatementKind::Schema, format!("CREATE USER {}", user.account()));
        self.user = Some(user);
        self
    }

    /// ` IDENTIFIED BY 'password'`
    pub fn identified_by(&mut self, password: &str) -> &mut Self {
        let quoted = quote_literal(password);
        self.push(&format!(" IDENTIFIED BY {quoted}"))
    }

    /// Set the user context without emitting SQL.
    pub fn for_user(&mut self, name: &str, scope: &str) -> &mut Self {
        self.user = Some(UserRef::new(name, scope));
        self
    }

    /// Start `GRANT <privileges> ON schema TO <user>`.
    pub fn grant_privileges(
        &mut self,
        privileges: impl Into<Privileges>,
        schema: &str,
    ) -> OrmResult<&mut Self> {
        let account = self.current_account("grant_privileges")?;
        let privileges = privileges.into().render()?;
        self.start(
            StatementKind::Schema,
            format!("GRANT {privileges} ON {schema} TO {account}"),
        );
        Ok(self)
    }

    /// Start `REVOKE <privileges> ON schema FROM <user>`.
    pub fn revoke_privileges(
        &mut self,
        privileges: impl Into<Privileges>,
        schema: &str,
    ) -> OrmResult<&mut Self> {
        let account = self.current_account("revoke_privileges")?;
        let privileges = privileges.into().render()?;
        self.start(
            StatementKind::Schema,
            format!("REVOKE {privileges} ON {schema} FROM {account}"),
        );
        Ok(self)
    }

    /// Start `SHOW GRANTS FOR <user>` (row-returning).
    pub fn show_grants(&mut self) -> OrmResult<&mut Self> {
        let account = self.current_account("show_grants")?;
        self.start(StatementKind::Select, format!("SHOW GRANTS FOR {account}"));
        Ok(self)
    }

    /// Start `SET PASSWORD FOR <user> = PASSWORD('password')`.
    pub fn set_password(&mut self, password: &str) -> OrmResult<&mut Self> {
        let account = self.current_account("set_password")?;
        let quoted = quote_literal(password);
        self.start(
            StatementKind::Schema,
            format!("SET PASSWORD FOR {account} = PASSWORD({quoted})"),
        );
        Ok(self)
    }

    /// Start `DROP USER 'name'@'scope'`.
    pub fn drop_user(&mut self, name: &str, scope: &str) -> &mut Self {
        self.start(StatementKind::Schema, format!("DROP USER {}", account(name, scope)));
        self
    }

    /// Start `SELECT user, host FROM mysql.user`.
    pub fn all_users(&mut self) -> &mut Self {
        self.start(StatementKind::Select, "SELECT user, host FROM mysql.user");
        self
    }

    /// Start `RENAME USER <user> TO 'name'@'scope'`; the renamed account becomes the context.
    pub fn rename_user(&mut self, name: &str, scope: &str) -> OrmResult<&mut Self> {
        let account = self.current_account("rename_user")?;
        let renamed = UserRef::new(name, scope);
        self.start(
            StatementKind::Schema,
            format!("RENAME USER {account} TO {}", renamed.account()),
        );
        self.user = Some(renamed);
        Ok(self)
    }

    /// Start `SET DEFAULT ROLE 'role' FOR <user>`.
    pub fn set_default_role(&mut self, role: &str) -> OrmResult<&mut Self> {
        let account = self.current_account("set_default_role")?;
        self.start(
            StatementKind::Schema,
            format!("SET DEFAULT ROLE {} FOR {account}", quote_literal(role)),
        );
        Ok(self)
    }

    /// Start `FLUSH PRIVILEGES`.
    pub fn flush_privileges(&mut self) -> &mut Self {
        self.start(StatementKind::Schema, "FLUSH PRIVILEGES");
        self
    }

    /// Start `ALTER USER 'name'@'scope' ACCOUNT LOCK`.
    pub fn lock_user_account(&mut self, name: &str, scope: &str) -> &mut Self {
        self.start(
            StatementKind::Schema,
            format!("ALTER USER {} ACCOUNT LOCK", account(name, scope)),
        );
        self
    }

    /// Start `ALTER USER 'name'@'scope' PASSWORD EXPIRE expiration`, e.g. `INTERVAL 90 DAY`
    /// or `NEVER`.
    pub fn password_expiration(&mut self, name: &str, scope: &str, expiration: &str) -> &mut Self {
        self.start(
            StatementKind::Schema,
            format!(
                "ALTER USER {} PASSWORD EXPIRE {}",
                account(name, scope),
                expiration.trim()
            ),
        );
        self
    }

    fn current_account(&self, operation: &str) -> OrmResult<String> {
        self.user.as_ref().map(UserRef::account).ok_or_else(|| {
            OrmError::usage(format!(
                "{operation} needs a user; call create_user or for_user first"
            ))
        })
    }
}
