use espat_core::{AtError, Result, constants::LINE_ENDING};
use std::fmt;

/// Builder for AT command lines with a fluent API
///
/// Arguments are typed (anything `Display`) and joined with commas after
/// an `=`. String arguments passed through [`quoted`](AtCommand::quoted) are
/// wrapped in double quotes with `\`, `"` and `,` escaped, so SSIDs and
/// passphrases containing those characters reach the module intact.
/// Arguments added with [`secret`](AtCommand::secret) are encoded the same
/// way but print as `"***"`, so a command can be logged without leaking
/// credentials.
///
/// # Example
/// ```
/// use espat_protocol::AtCommand;
///
/// let cmd = AtCommand::new("AT+CWJAP_CUR")
///     .quoted("home,net")
///     .secret("hunter2");
/// assert_eq!(cmd.to_string(), r#"AT+CWJAP_CUR="home\,net","***""#);
/// assert_eq!(cmd.to_line(), "AT+CWJAP_CUR=\"home\\,net\",\"hunter2\"\r\n");
///
/// let query = AtCommand::query("AT+CIPAP");
/// assert_eq!(query.to_line(), "AT+CIPAP?\r\n");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AtCommand {
    name: String,
    args: Vec<String>,
    secrets: Vec<usize>,
    query: bool,
}

impl AtCommand {
    /// Start a command, e.g. `AT+CWMODE`. Without arguments it is sent bare.
    pub fn new(name: impl Into<String>) -> Self {
        AtCommand {
            name: name.into(),
            args: Vec::new(),
            secrets: Vec::new(),
            query: false,
        }
    }

    /// A query command: the name followed by `?`.
    pub fn query(name: impl Into<String>) -> Self {
        AtCommand {
            query: true,
            ..Self::new(name)
        }
    }

    /// Append an unquoted argument.
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// Append a quoted, escaped string argument.
    pub fn quoted(mut self, value: &str) -> Self {
        self.args.push(quote(value));
        self
    }

    /// Append a quoted argument that is sent as-is but never displayed.
    pub fn secret(mut self, value: &str) -> Self {
        self.secrets.push(self.args.len());
        self.quoted(value)
    }

    /// Command name as given to the constructor.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full line as sent, secrets included, with the trailing `\r\n`.
    pub fn to_line(&self) -> String {
        let mut line = self.render(false);
        line.push_str("\r\n");
        line
    }

    /// Encode the line, enforcing a length limit.
    ///
    /// # Errors
    /// Returns `AtError::CommandTooLong` if the line (line ending included)
    /// is longer than `limit` bytes.
    pub fn encode(&self, limit: usize) -> Result<Vec<u8>> {
        let mut line = self.render(false).into_bytes();
        line.extend_from_slice(LINE_ENDING);
        if line.len() > limit {
            return Err(AtError::CommandTooLong {
                len: line.len(),
                limit,
            });
        }
        Ok(line)
    }

    fn render(&self, redact: bool) -> String {
        let mut out = self.name.clone();
        if self.query {
            out.push('?');
        }
        for (index, arg) in self.args.iter().enumerate() {
            out.push(if index == 0 { '=' } else { ',' });
            if redact && self.secrets.contains(&index) {
                out.push_str("\"***\"");
            } else {
                out.push_str(arg);
            }
        }
        out
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '\\' | '"' | ',') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

impl fmt::Display for AtCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.render(true))
    }
}

impl fmt::Debug for AtCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("AtCommand").field(&self.render(true)).finish()
    }
}

impl From<&str> for AtCommand {
    fn from(name: &str) -> Self {
        AtCommand::new(name)
    }
}
