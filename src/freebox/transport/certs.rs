// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Pinned root certificates for the Freebox HTTPS API
//!
//! The Freebox serves a chain issued by its own root CA on the local name and a
//! Let's Encrypt (ISRG Root X2) chain on its dynamic DNS name. Only these two
//! roots are trusted.

use std::sync::Arc;

use rustls::pki_types::CertificateDer;
use rustls::pki_types::pem::PemObject;
use rustls::{ClientConfig, RootCertStore};
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};

/// An embedded root certificate with the SHA-256 fingerprint of its DER form
#[derive(Debug, Clone, Copy)]
pub struct PinnedRoot<'a> {
    pub name: &'a str,
    pub pem: &'a str,
    pub sha256: &'a str,
}

/// Freebox Root CA, see <https://dev.freebox.fr/sdk/os/#https-access>
pub const FREEBOX_ROOT_CA: PinnedRoot<'static> = PinnedRoot {
    name: "Freebox Root CA",
    pem: include_str!("../../../certs/freebox_root_ca.pem"),
    sha256: "2bd8b5be1a990e42ad1bd79c306eb519b637ee2475c0d931f257535610e9c3e7",
};

/// ISRG Root X2, see <https://letsencrypt.org/certificates/>
pub const ISRG_ROOT_X2: PinnedRoot<'static> = PinnedRoot {
    name: "ISRG Root X2",
    pem: include_str!("../../../certs/isrg_root_x2.pem"),
    sha256: "69729b8e15a86efc177a57afb7171dfc64add28c2fca8cf1507e34453ccb1470",
};

/// The trust anchors used for every Freebox connection
pub const PINNED_ROOTS: [PinnedRoot<'static>; 2] = [FREEBOX_ROOT_CA, ISRG_ROOT_X2];

impl PinnedRoot<'_> {
    /// Decodes the PEM block and checks it against the pinned fingerprint
    ///
    /// # Errors
    ///
    /// Returns `AppError::Tls` if the PEM is malformed, does not hold exactly one
    /// certificate, or does not match the fingerprint.
    pub fn to_der(&self) -> Result<CertificateDer<'static>> {
        let mut certs = CertificateDer::pem_slice_iter(self.pem.as_bytes())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Tls(format!("{}: invalid PEM: {e}", self.name)))?;
        if certs.len() != 1 {
            return Err(AppError::Tls(format!(
                "{}: expected one certificate, found {}",
                self.name,
                certs.len()
            )));
        }
        let cert = certs.remove(0);

        let fingerprint = hex::encode(Sha256::digest(cert.as_ref()));
        if !fingerprint.eq_ignore_ascii_case(self.sha256) {
            return Err(AppError::Tls(format!(
                "{}: fingerprint mismatch (got {fingerprint})",
                self.name
            )));
        }
        Ok(cert)
    }
}

/// Builds a trust store holding exactly the given roots
///
/// # Errors
///
/// Returns `AppError::Tls` if any root fails to decode or is rejected by the store.
pub fn root_store(roots: &[PinnedRoot<'_>]) -> Result<RootCertStore> {
    let mut store = RootCertStore::empty();
    for root in roots {
        let cert = root.to_der()?;
        store
            .add(cert)
            .map_err(|e| AppError::Tls(format!("{}: rejected by trust store: {e}", root.name)))?;
        tracing::trace!("Pinned root certificate loaded: {}", root.name);
    }
    Ok(store)
}

/// Builds a rustls client configuration trusting only the given roots
///
/// # Errors
///
/// Returns `AppError::Tls` if the trust store or the configuration cannot be built.
pub fn client_config(roots: &[PinnedRoot<'_>]) -> Result<ClientConfig> {
    let store = root_store(roots)?;
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| AppError::Tls(format!("protocol versions: {e}")))?
        .with_root_certificates(store)
        .with_no_client_auth();
    Ok(config)
}
