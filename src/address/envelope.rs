use super::Address;
use crate::Error;

/// Simple email envelope representation
///
/// The sender is what ends up in the `-f` flag of the sendmail command line,
/// recipients are left to the binary, which reads them from the message headers.
#[derive(PartialEq, Eq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Envelope {
    /// The envelope recipients' addresses
    ///
    /// This can not be empty.
    forward_path: Vec<Address>,
    /// The envelope sender address
    reverse_path: Option<Address>,
}

impl Envelope {
    /// Creates a new envelope, which may fail if `to` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::str::FromStr;
    /// # use mailhog_sendmail::{Address, Envelope};
    ///
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// let sender = Address::from_str("from@email.com")?;
    /// let recipients = vec![Address::from_str("to@email.com")?];
    ///
    /// let envelope = Envelope::new(Some(sender), recipients)?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// If `to` has no elements in it.
    pub fn new(from: Option<Address>, to: Vec<Address>) -> Result<Envelope, Error> {
        if to.is_empty() {
            return Err(Error::MissingTo);
        }
        Ok(Envelope {
            forward_path: to,
            reverse_path: from,
        })
    }

    /// Parses the sender and recipients, then builds the envelope.
    ///
    /// ```
    /// # use mailhog_sendmail::Envelope;
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// let envelope = Envelope::parse(Some("from@email.com"), ["to@email.com"])?;
    /// assert_eq!(envelope.from().map(ToString::to_string).as_deref(), Some("from@email.com"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse<'a, I>(from: Option<&str>, to: I) -> Result<Envelope, Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let from = from.map(str::parse::<Address>).transpose()?;
        let to = to
            .into_iter()
            .map(str::parse::<Address>)
            .collect::<Result<Vec<Address>, _>>()?;
        Envelope::new(from, to)
    }

    /// Gets the destination addresses of the envelope.
    pub fn to(&self) -> &[Address] {
        self.forward_path.as_slice()
    }

    /// Gets the sender of the envelope.
    pub fn from(&self) -> Option<&Address> {
        self.reverse_path.as_ref()
    }
}
