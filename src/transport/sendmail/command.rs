//! Sendmail command lines

use std::{
    fmt::{self, Display, Formatter},
    process::{Command, Stdio},
};

use crate::{
    transport::error::{self, Error},
    Address,
};

/// Command of MailHog's sendmail replacement, delivering to a `sendmailhog` host
pub const MAILHOG_COMMAND: &str = "/usr/local/bin/mhsendmail --smtp-addr='sendmailhog:1025'";

/// A sendmail command line, run through the system shell
///
/// If the command line has no ` -f` flag, one is appended for the envelope
/// sender on every delivery. If it has neither ` -i` nor ` -oi`, message lines
/// starting with a `.` are dot-stuffed.
///
/// ```
/// use mailhog_sendmail::{Address, SendmailCommand};
///
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let command = SendmailCommand::new("/usr/sbin/sendmail -t");
/// let sender = "from@email.com".parse::<Address>()?;
/// assert_eq!(
///     command.line_for(&sender)?,
///     "/usr/sbin/sendmail -t -f'from@email.com'"
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "String", into = "String")
)]
pub struct SendmailCommand {
    line: String,
    shell: String,
    shell_arg: String,
}

impl SendmailCommand {
    /// Creates a command from a shell command line
    pub fn new(line: impl Into<String>) -> Self {
        let (shell, shell_arg) = default_shell();
        Self {
            line: line.into(),
            shell: shell.to_owned(),
            shell_arg: shell_arg.to_owned(),
        }
    }

    /// Creates the [`MAILHOG_COMMAND`]
    pub fn mailhog() -> Self {
        Self::new(MAILHOG_COMMAND)
    }

    /// Runs the command line with `program arg <line>` instead of the system shell
    pub fn with_shell(mut self, program: impl Into<String>, arg: impl Into<String>) -> Self {
        self.shell = program.into();
        self.shell_arg = arg.into();
        self
    }

    /// The configured command line, without the sender flag
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Returns true if the command line already sets the envelope sender
    pub fn has_sender_flag(&self) -> bool {
        has_sender_flag(&self.line)
    }

    /// Builds the command line used to deliver a message from `sender`
    pub fn line_for(&self, sender: &Address) -> Result<String, Error> {
        if self.has_sender_flag() {
            return Ok(self.line.clone());
        }

        let sender = sender.encoded().map_err(error::address)?;
        if sender.contains('\0') {
            return Err(error::address("sender contains a NUL byte"));
        }

        Ok(format!("{} -f{}", self.line, shell_escape(&sender)))
    }

    pub(super) fn process(&self, line: &str) -> Command {
        let mut c = Command::new(&self.shell);
        c.arg(&self.shell_arg)
            .arg(line)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        c
    }
}

impl Display for SendmailCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

impl From<String> for SendmailCommand {
    fn from(line: String) -> Self {
        Self::new(line)
    }
}

impl From<&str> for SendmailCommand {
    fn from(line: &str) -> Self {
        Self::new(line)
    }
}

impl From<SendmailCommand> for String {
    fn from(command: SendmailCommand) -> Self {
        command.line
    }
}

/// Returns true if the command line already sets the envelope sender with ` -f`
pub fn has_sender_flag(line: &str) -> bool {
    line.contains(" -f")
}

/// Returns true unless the command line tells sendmail to ignore lone dots
pub fn stuffs_dots(line: &str) -> bool {
    !line.contains(" -i") && !line.contains(" -oi")
}

/// Quotes `arg` so that the shell passes it as one single argument.
#[cfg(not(windows))]
pub fn shell_escape(arg: &str) -> String {
    let mut escaped = String::with_capacity(arg.len() + 2);
    escaped.push('\'');
    for c in arg.chars() {
        if c == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(c);
        }
    }
    escaped.push('\'');
    escaped
}

/// Quotes `arg` so that the shell passes it as one single argument.
///
/// `cmd` has no way to escape `"`, `%` or `!` inside quotes, they are replaced by spaces.
#[cfg(windows)]
pub fn shell_escape(arg: &str) -> String {
    let mut escaped = String::with_capacity(arg.len() + 2);
    escaped.push('"');
    for c in arg.chars() {
        match c {
            '"' | '%' | '!' => escaped.push(' '),
            c => escaped.push(c),
        }
    }
    escaped.push('"');
    escaped
}

fn default_shell() -> (&'static str, &'static str) {
    #[cfg(windows)]
    let windows = !std::env::var("MSYSTEM")
        .map(|env| env.starts_with("MINGW"))
        .unwrap_or_default();
    #[cfg(not(windows))]
    let windows = false;

    if windows {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sender(address: &str) -> Address {
        Address::new_unchecked(address.to_owned())
    }

    #[test]
    fn appends_sender_flag() {
        let command = SendmailCommand::mailhog();
        assert!(!command.has_sender_flag());
        assert_eq!(
            command.line_for(&sender("from@email.com")).unwrap(),
            "/usr/local/bin/mhsendmail --smtp-addr='sendmailhog:1025' -f'from@email.com'"
        );
    }

    #[test]
    fn keeps_existing_sender_flag() {
        let command = SendmailCommand::new("/usr/sbin/sendmail -t -fbounce@email.com");
        assert!(command.has_sender_flag());
        assert_eq!(
            command.line_for(&sender("from@email.com")).unwrap(),
            "/usr/sbin/sendmail -t -fbounce@email.com"
        );
    }

    #[test]
    fn sender_flag_detection() {
        assert!(has_sender_flag("/usr/sbin/sendmail -t -fbounce@email.com"));
        assert!(has_sender_flag("/usr/sbin/sendmail -f bounce@email.com"));
        assert!(!has_sender_flag("/usr/sbin/sendmail -t"));
        assert!(!has_sender_flag("/usr/sbin/sendmail-f"));
        assert_eq!(
            SendmailCommand::new("sendmail -fa@b.c").has_sender_flag(),
            has_sender_flag("sendmail -fa@b.c")
        );
    }

    #[test]
    fn stuffing_depends_on_flags() {
        assert!(stuffs_dots("/usr/sbin/sendmail -t"));
        assert!(stuffs_dots("/usr/sbin/sendmail -bs"));
        assert!(!stuffs_dots("/usr/sbin/sendmail -i -t"));
        assert!(!stuffs_dots("/usr/sbin/sendmail -oi -t"));
    }

    #[cfg(not(windows))]
    #[test]
    fn escapes_metacharacters() {
        assert_eq!(shell_escape("a\"b@example.com"), "'a\"b@example.com'");
        assert_eq!(shell_escape("a'b@example.com"), "'a'\\''b@example.com'");
        assert_eq!(
            shell_escape("$(reboot);`id`@example.com"),
            "'$(reboot);`id`@example.com'"
        );
    }

    #[test]
    fn encodes_idna_sender() {
        let command = SendmailCommand::new("sendmail");
        let address = Address::new("user", "bücher.example").unwrap();
        assert_eq!(
            command.line_for(&address).unwrap(),
            format!("sendmail -f{}", shell_escape("user@xn--bcher-kva.example"))
        );
    }

    #[test]
    fn rejects_nul_byte() {
        let command = SendmailCommand::new("sendmail");
        let err = command.line_for(&sender("a\0b@example.com")).unwrap_err();
        assert!(err.is_address());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_as_string() {
        let command: SendmailCommand =
            serde_json::from_str(r#""/usr/sbin/sendmail -i -t""#).unwrap();
        assert_eq!(command.line(), "/usr/sbin/sendmail -i -t");
        assert_eq!(
            serde_json::to_string(&command).unwrap(),
            r#""/usr/sbin/sendmail -i -t""#
        );
    }

    #[test]
    fn display_is_the_line() {
        let command = SendmailCommand::from("sendmail -i");
        assert_eq!(command.to_string(), "sendmail -i");
        assert_eq!(String::from(command), "sendmail -i");
    }
}
