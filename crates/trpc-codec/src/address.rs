use std::fmt;
use std::str::FromStr;

/// Separator between service and method in a method address.
pub const SEPARATOR: char = '.';

/// Why a method address was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("method address is empty")]
    Empty,

    #[error("method address '{0}' must have the form <service>.<method>")]
    MissingSeparator(String),

    #[error("method address '{0}' contains more than one '.'")]
    TooManySeparators(String),

    #[error("method address '{0}' has an empty service name")]
    EmptyService(String),

    #[error("method address '{0}' has an empty method name")]
    EmptyMethod(String),
}

/// A validated `"<service>.<method>"` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodAddress {
    service: String,
    method: String,
}

impl MethodAddress {
    /// Parse an address of the exact form `"<service>.<method>"`.
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        if address.is_empty() {
            return Err(AddressError::Empty);
        }

        let mut parts = address.split(SEPARATOR);
        let (service, method) = match (parts.next(), parts.next(), parts.next()) {
            (Some(service), Some(method), None) => (service, method),
            (Some(_), None, _) => return Err(AddressError::MissingSeparator(address.to_string())),
            _ => return Err(AddressError::TooManySeparators(address.to_string())),
        };

        if service.is_empty() {
            return Err(AddressError::EmptyService(address.to_string()));
        }
        if method.is_empty() {
            return Err(AddressError::EmptyMethod(address.to_string()));
        }

        Ok(Self {
            service: service.to_string(),
            method: method.to_string(),
        })
    }

    /// Build an address from parts, validating each side.
    pub fn new(service: &str, method: &str) -> Result<Self, AddressError> {
        Self::parse(&format!("{service}{SEPARATOR}{method}"))
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl FromStr for MethodAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MethodAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.service, SEPARATOR, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_addresses() {
        for (input, service, method) in [
            ("hello_service.Hello", "hello_service", "Hello"),
            ("a.b", "a", "b"),
            ("user_service.User", "user_service", "User"),
        ] {
            let addr = MethodAddress::parse(input).unwrap();
            assert_eq!(addr.service(), service);
            assert_eq!(addr.method(), method);
            assert_eq!(addr.to_string(), input);
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert_eq!(MethodAddress::parse(""), Err(AddressError::Empty));
        assert!(matches!(
            MethodAddress::parse("hello_service"),
            Err(AddressError::MissingSeparator(_))
        ));
        assert!(matches!(
            MethodAddress::parse("a.b.c"),
            Err(AddressError::TooManySeparators(_))
        ));
        assert!(matches!(
            MethodAddress::parse("a..b"),
            Err(AddressError::TooManySeparators(_))
        ));
        assert!(matches!(
            MethodAddress::parse(".Hello"),
            Err(AddressError::EmptyService(_))
        ));
        assert!(matches!(
            MethodAddress::parse("hello_service."),
            Err(AddressError::EmptyMethod(_))
        ));
        assert!(matches!(
            MethodAddress::parse("."),
            Err(AddressError::EmptyService(_))
        ));
    }

    #[test]
    fn new_rejects_separator_inside_parts() {
        assert!(MethodAddress::new("svc", "Method").is_ok());
        assert!(matches!(
            MethodAddress::new("svc.v2", "Method"),
            Err(AddressError::TooManySeparators(_))
        ));
    }
}
