//! Named TLS/transport profiles a client is allowed to negotiate
//!
//! A client carries an ordered list of connection specs. `https` URLs need at
//! least one TLS spec, `http` URLs need [`CLEARTEXT`]. The TLS versions of all
//! TLS specs in the list bound the versions the TLS backend may negotiate.

use anyhow::{Result, bail};
use std::fmt;

/// TLS protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TlsVersion {
    Tls10,
    Tls11,
    Tls12,
    Tls13,
}

impl TlsVersion {
    /// Name as it appears in a TLS handshake description
    pub fn protocol_name(&self) -> &'static str {
        match self {
            TlsVersion::Tls10 => "TLSv1",
            TlsVersion::Tls11 => "TLSv1.1",
            TlsVersion::Tls12 => "TLSv1.2",
            TlsVersion::Tls13 => "TLSv1.3",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::tls::Version {
        match self {
            TlsVersion::Tls10 => reqwest::tls::Version::TLS_1_0,
            TlsVersion::Tls11 => reqwest::tls::Version::TLS_1_1,
            TlsVersion::Tls12 => reqwest::tls::Version::TLS_1_2,
            TlsVersion::Tls13 => reqwest::tls::Version::TLS_1_3,
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.protocol_name())
    }
}

/// AEAD and forward-secret suites, TLS 1.3 suites first.
const RESTRICTED_CIPHER_SUITES: &[&str] = &[
    "TLS_AES_128_GCM_SHA256",
    "TLS_AES_256_GCM_SHA384",
    "TLS_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256",
];

/// Restricted suites plus the CBC and RSA key-exchange suites still served
/// by older endpoints.
const APPROVED_CIPHER_SUITES: &[&str] = &[
    "TLS_AES_128_GCM_SHA256",
    "TLS_AES_256_GCM_SHA384",
    "TLS_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA",
    "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA",
    "TLS_RSA_WITH_AES_128_GCM_SHA256",
    "TLS_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_RSA_WITH_AES_128_CBC_SHA",
    "TLS_RSA_WITH_AES_256_CBC_SHA",
    "TLS_RSA_WITH_3DES_EDE_CBC_SHA",
];

/// A named profile describing which transport and TLS parameters a
/// connection attempt may use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSpec {
    name: &'static str,
    tls: bool,
    tls_versions: &'static [TlsVersion],
    cipher_suites: &'static [&'static str],
}

/// TLS 1.2+ with AEAD suites only
pub const RESTRICTED_TLS: ConnectionSpec = ConnectionSpec {
    name: "RESTRICTED_TLS",
    tls: true,
    tls_versions: &[TlsVersion::Tls13, TlsVersion::Tls12],
    cipher_suites: RESTRICTED_CIPHER_SUITES,
};

/// TLS 1.2+ with the widely deployed modern suites
pub const MODERN_TLS: ConnectionSpec = ConnectionSpec {
    name: "MODERN_TLS",
    tls: true,
    tls_versions: &[TlsVersion::Tls13, TlsVersion::Tls12],
    cipher_suites: APPROVED_CIPHER_SUITES,
};

/// Modern suites, but also TLS 1.0 and 1.1
pub const COMPATIBLE_TLS: ConnectionSpec = ConnectionSpec {
    name: "COMPATIBLE_TLS",
    tls: true,
    tls_versions: &[
        TlsVersion::Tls13,
        TlsVersion::Tls12,
        TlsVersion::Tls11,
        TlsVersion::Tls10,
    ],
    cipher_suites: APPROVED_CIPHER_SUITES,
};

/// Unencrypted, unauthenticated connections for `http:` URLs
pub const CLEARTEXT: ConnectionSpec = ConnectionSpec {
    name: "CLEARTEXT",
    tls: false,
    tls_versions: &[],
    cipher_suites: &[],
};

impl ConnectionSpec {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_tls(&self) -> bool {
        self.tls
    }

    /// Allowed TLS versions, preferred first. Empty for [`CLEARTEXT`].
    pub fn tls_versions(&self) -> &'static [TlsVersion] {
        self.tls_versions
    }

    /// Allowed cipher suites, preferred first. Empty for [`CLEARTEXT`].
    pub fn cipher_suites(&self) -> &'static [&'static str] {
        self.cipher_suites
    }
}

impl fmt::Display for ConnectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.tls {
            return write!(f, "ConnectionSpec(name={})", self.name);
        }
        let versions: Vec<&str> = self
            .tls_versions
            .iter()
            .map(|v| v.protocol_name())
            .collect();
        write!(
            f,
            "ConnectionSpec(name={}, tls_versions=[{}], cipher_suites={})",
            self.name,
            versions.join(", "),
            self.cipher_suites.len()
        )
    }
}

/// Lowest and highest TLS versions permitted by any TLS spec in `specs`
///
/// Returns `None` when the list has no TLS spec at all.
pub fn tls_version_bounds(specs: &[ConnectionSpec]) -> Option<(TlsVersion, TlsVersion)> {
    let mut versions = specs
        .iter()
        .filter(|spec| spec.is_tls())
        .flat_map(|spec| spec.tls_versions().iter().copied());
    let first = versions.next()?;
    Some(versions.fold((first, first), |(min, max), v| (min.min(v), max.max(v))))
}

/// Reject spec lists no connection could ever be made with
pub fn validate_connection_specs(specs: &[ConnectionSpec]) -> Result<()> {
    if specs.is_empty() {
        bail!("connection specs must not be empty");
    }
    if let Some(spec) = specs.iter().find(|s| s.is_tls() && s.tls_versions().is_empty()) {
        bail!("connection spec {} has no TLS versions", spec.name());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modern_tls_is_tls12_and_up() {
        assert!(MODERN_TLS.is_tls());
        assert_eq!(
            MODERN_TLS.tls_versions(),
            &[TlsVersion::Tls13, TlsVersion::Tls12]
        );
        assert_eq!(MODERN_TLS.cipher_suites()[0], "TLS_AES_128_GCM_SHA256");
    }

    #[test]
    fn test_cleartext_has_no_tls_parameters() {
        assert!(!CLEARTEXT.is_tls());
        assert!(CLEARTEXT.tls_versions().is_empty());
        assert!(CLEARTEXT.cipher_suites().is_empty());
        assert_eq!(CLEARTEXT.to_string(), "ConnectionSpec(name=CLEARTEXT)");
    }

    #[test]
    fn test_restricted_suites_are_prefix_of_approved() {
        let restricted = RESTRICTED_TLS.cipher_suites();
        assert_eq!(&MODERN_TLS.cipher_suites()[..restricted.len()], restricted);
    }

    #[test]
    fn test_tls_version_bounds() {
        assert_eq!(
            tls_version_bounds(&[MODERN_TLS, CLEARTEXT]),
            Some((TlsVersion::Tls12, TlsVersion::Tls13))
        );
        assert_eq!(
            tls_version_bounds(&[COMPATIBLE_TLS]),
            Some((TlsVersion::Tls10, TlsVersion::Tls13))
        );
        assert_eq!(tls_version_bounds(&[CLEARTEXT]), None);
    }

    #[test]
    fn test_validate_connection_specs() {
        assert!(validate_connection_specs(&[MODERN_TLS, CLEARTEXT]).is_ok());
        assert!(validate_connection_specs(&[CLEARTEXT]).is_ok());

        let err = validate_connection_specs(&[]).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_display_names_versions() {
        let text = MODERN_TLS.to_string();
        assert!(text.contains("MODERN_TLS"));
        assert!(text.contains("TLSv1.3, TLSv1.2"));
    }
}
