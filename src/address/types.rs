//! Representation of an email address

use std::{
    borrow::Cow,
    error::Error,
    ffi::OsStr,
    fmt::{Display, Formatter, Result as FmtResult},
    net::IpAddr,
    str::FromStr,
};

use email_address::EmailAddress;
use idna::domain_to_ascii;

/// Represents an email address with a user and a domain name.
///
/// This type contains email in canonical form (_user@domain.tld_).
///
/// # Examples
///
/// ```
/// use mailhog_sendmail::Address;
///
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let address = "user@email.com".parse::<Address>()?;
/// assert_eq!(address.user(), "user");
/// assert_eq!(address.domain(), "email.com");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Address {
    /// Complete address
    serialized: String,
    /// Index into `serialized` before the '@'
    at_start: usize,
}

impl Address {
    /// Creates a new email address from a user and domain.
    pub fn new<U: AsRef<str>, D: AsRef<str>>(user: U, domain: D) -> Result<Self, AddressError> {
        (user, domain).try_into()
    }

    /// Creates a new email address from a string without checking it.
    ///
    /// # Panics
    /// Will panic if @ is not present in the string
    pub fn new_unchecked(serialized: String) -> Self {
        let at_start = serialized.rfind('@').expect("address without @");

        Self {
            serialized,
            at_start,
        }
    }

    /// Gets the user portion of the `Address`.
    pub fn user(&self) -> &str {
        &self.serialized[..self.at_start]
    }

    /// Gets the domain portion of the `Address`.
    pub fn domain(&self) -> &str {
        &self.serialized[self.at_start + 1..]
    }

    /// Gets the address with its domain converted to its IDNA ASCII form,
    /// suitable for a sendmail command line.
    ///
    /// ```
    /// use mailhog_sendmail::Address;
    ///
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// let address = "user@bücher.example".parse::<Address>()?;
    /// assert_eq!(address.encoded()?, "user@xn--bcher-kva.example");
    /// # Ok(())
    /// # }
    /// ```
    pub fn encoded(&self) -> Result<Cow<'_, str>, AddressError> {
        let domain = self.domain();
        if domain.is_ascii() {
            return Ok(Cow::Borrowed(&self.serialized));
        }

        let domain = domain_to_ascii(domain).map_err(|_| AddressError::InvalidDomain)?;
        Ok(Cow::Owned(format!("{}@{}", self.user(), domain)))
    }

    pub(super) fn check_user(user: &str) -> Result<(), AddressError> {
        if EmailAddress::is_valid_local_part(user) {
            Ok(())
        } else {
            Err(AddressError::InvalidUser)
        }
    }

    pub(super) fn check_domain(domain: &str) -> Result<(), AddressError> {
        Address::check_domain_ascii(domain).or_else(|_| {
            domain_to_ascii(domain)
                .map_err(|_| AddressError::InvalidDomain)
                .and_then(|domain| Address::check_domain_ascii(&domain))
        })
    }

    fn check_domain_ascii(domain: &str) -> Result<(), AddressError> {
        if EmailAddress::is_valid_domain(domain) {
            return Ok(());
        }

        // IP literal, with or without brackets
        let ip = domain
            .strip_prefix('[')
            .and_then(|ip| ip.strip_suffix(']'))
            .unwrap_or(domain);

        if ip.parse::<IpAddr>().is_ok() {
            return Ok(());
        }

        Err(AddressError::InvalidDomain)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.serialized)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(val: &str) -> Result<Self, AddressError> {
        let at_start = check_address(val)?;
        Ok(Address {
            serialized: val.into(),
            at_start,
        })
    }
}

impl<U, D> TryFrom<(U, D)> for Address
where
    U: AsRef<str>,
    D: AsRef<str>,
{
    type Error = AddressError;

    fn try_from((user, domain): (U, D)) -> Result<Self, Self::Error> {
        let user = user.as_ref();
        Address::check_user(user)?;

        let domain = domain.as_ref();
        Address::check_domain(domain)?;

        Ok(Address {
            serialized: format!("{user}@{domain}"),
            at_start: user.len(),
        })
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(serialized: String) -> Result<Self, AddressError> {
        let at_start = check_address(&serialized)?;
        Ok(Address {
            serialized,
            at_start,
        })
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.serialized
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.serialized
    }
}

impl AsRef<OsStr> for Address {
    fn as_ref(&self) -> &OsStr {
        self.serialized.as_ref()
    }
}

fn check_address(val: &str) -> Result<usize, AddressError> {
    let (user, domain) = val.rsplit_once('@').ok_or(AddressError::MissingParts)?;

    Address::check_user(user)?;
    Address::check_domain(domain)?;
    Ok(user.len())
}

/// Errors in email addresses parsing
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum AddressError {
    /// Missing domain or user
    MissingParts,
    /// Invalid email user
    InvalidUser,
    /// Invalid email domain
    InvalidDomain,
}

impl Error for AddressError {}

impl Display for AddressError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AddressError::MissingParts => f.write_str("Missing domain or user"),
            AddressError::InvalidUser => f.write_str("Invalid email user"),
            AddressError::InvalidDomain => f.write_str("Invalid email domain"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_address() {
        let addr = Address::from_str("something@example.com").unwrap();
        let addr2 = Address::new("something", "example.com").unwrap();
        assert_eq!(addr, addr2);
        assert_eq!(addr.user(), "something");
        assert_eq!(addr.domain(), "example.com");
    }

    #[test]
    fn ascii_address_ipv6() {
        let addr = Address::from_str("something@[2606:4700:4700::1111]").unwrap();
        assert_eq!(addr.user(), "something");
        assert_eq!(addr.domain(), "[2606:4700:4700::1111]");
        assert_eq!(addr.encoded().unwrap(), "something@[2606:4700:4700::1111]");
    }

    #[test]
    fn missing_parts() {
        assert_eq!(
            Address::from_str("somethingexample.com"),
            Err(AddressError::MissingParts)
        );
        assert_eq!(
            Address::from_str("something@"),
            Err(AddressError::InvalidDomain)
        );
    }

    #[test]
    fn encoded_ascii_is_borrowed() {
        let addr = Address::from_str("user@example.com").unwrap();
        assert!(matches!(addr.encoded(), Ok(Cow::Borrowed("user@example.com"))));
    }

    #[test]
    fn encoded_idna_domain() {
        let addr = Address::new("user", "bücher.example").unwrap();
        assert_eq!(addr.encoded().unwrap(), "user@xn--bcher-kva.example");
    }

    #[test]
    fn new_unchecked_keeps_input() {
        let addr = Address::new_unchecked("a\"b@example.com".to_owned());
        assert_eq!(addr.user(), "a\"b");
        assert_eq!(addr.domain(), "example.com");
    }

    #[test]
    #[should_panic]
    fn new_unchecked_panic() {
        Address::new_unchecked("somethingexample.com".to_owned());
    }
}
