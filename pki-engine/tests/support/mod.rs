//! In-memory PKI backend and gateway used by the engine tests.
//!
//! The backend stores rcgen-generated certificates and regenerates its
//! CRL whenever the revoked set changes, mirroring how the real backend
//! only rewrites the CRL on revocation or rotation.

use async_trait::async_trait;
use pki_engine::backend::{IssuedCertificate, PkiBackend};
use pki_engine::{PkiError, Result};
use rcgen::{
    date_time_ymd, BasicConstraints, CertificateParams, CertificateRevocationListParams, DnType,
    ExtendedKeyUsagePurpose, IsCa, KeyIdMethod, KeyPair, RevokedCertParams, SerialNumber,
};
use std::collections::BTreeMap;
use std::sync::Mutex;
use vpn_gateway::{GatewayError, VpnGateway};

pub struct StoredCert {
    pub key: String,
    pub pem: String,
}

#[derive(Default)]
pub struct BackendState {
    certs: Vec<StoredCert>,
    revoked: Vec<String>,
    crl_pem: String,
    pub revoke_calls: usize,
    pub rotate_calls: usize,
    pub stored_configs: BTreeMap<String, String>,
    pub fail_revoke_after: Option<usize>,
    issued: u8,
}

pub struct FakeBackend {
    ca_key: KeyPair,
    ca_cert: rcgen::Certificate,
    ca_pem: String,
    pub state: Mutex<BackendState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let ca_key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        params
            .distinguished_name
            .push(DnType::CommonName, "Test Root CA");
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let ca_cert = params.self_signed(&ca_key).unwrap();
        let ca_pem = ca_cert.pem();

        let backend = Self {
            ca_key,
            ca_cert,
            ca_pem,
            state: Mutex::new(BackendState::default()),
        };
        let mut state = backend.state.lock().unwrap();
        backend.rebuild_crl(&mut state);
        drop(state);
        backend
    }

    pub fn ca_pem(&self) -> String {
        self.ca_pem.clone()
    }

    /// Stores a self-signed leaf certificate for `common_name`.
    pub fn add_leaf(&self, common_name: &str, serial: u8, not_before: (i32, u8, u8)) {
        self.add_cert(leaf_params(common_name, serial, not_before), serial);
    }

    /// Stores a leaf carrying the server-auth extended key usage.
    pub fn add_server_auth_leaf(&self, common_name: &str, serial: u8, not_before: (i32, u8, u8)) {
        let mut params = leaf_params(common_name, serial, not_before);
        params
            .extended_key_usages
            .push(ExtendedKeyUsagePurpose::ServerAuth);
        self.add_cert(params, serial);
    }

    /// Stores a CA certificate entry.
    pub fn add_ca_entry(&self, serial: u8) {
        let mut params = leaf_params("Test Intermediate CA", serial, (2023, 1, 1));
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        self.add_cert(params, serial);
    }

    pub fn revoked_serials(&self) -> Vec<String> {
        self.state.lock().unwrap().revoked.clone()
    }

    fn add_cert(&self, params: CertificateParams, serial: u8) {
        let key = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();

        self.state.lock().unwrap().certs.push(StoredCert {
            key: format!("{:02x}", serial),
            pem: cert.pem(),
        });
    }

    fn rebuild_crl(&self, state: &mut BackendState) {
        let revoked_certs = state
            .revoked
            .iter()
            .map(|serial| RevokedCertParams {
                serial_number: SerialNumber::from(serial_bytes(serial)),
                revocation_time: date_time_ymd(2024, 1, 2),
                reason_code: None,
                invalidity_date: None,
            })
            .collect();

        let params = CertificateRevocationListParams {
            this_update: date_time_ymd(2024, 1, 1),
            next_update: date_time_ymd(2040, 1, 1),
            crl_number: SerialNumber::from(vec![1u8]),
            issuing_distribution_point: None,
            revoked_certs,
            key_identifier_method: KeyIdMethod::Sha256,
        };

        state.crl_pem = params
            .signed_by(&self.ca_cert, &self.ca_key)
            .unwrap()
            .pem()
            .unwrap();
    }
}

#[async_trait]
impl PkiBackend for FakeBackend {
    async fn list_certificates(&self, _pki_path: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        Ok(state.certs.iter().map(|cert| cert.key.clone()).collect())
    }

    async fn read_certificate(&self, _pki_path: &str, key: &str) -> Result<String> {
        let state = self.state.lock().unwrap();
        state
            .certs
            .iter()
            .find(|cert| cert.key == key)
            .map(|cert| cert.pem.clone())
            .ok_or_else(|| PkiError::BackendUnavailable(format!("no certificate {}", key)))
    }

    async fn read_ca_pem(&self, _pki_path: &str) -> Result<String> {
        Ok(self.ca_pem.clone())
    }

    async fn read_crl_pem(&self, _pki_path: &str) -> Result<String> {
        Ok(self.state.lock().unwrap().crl_pem.clone())
    }

    async fn rotate_crl(&self, _pki_path: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.rotate_calls += 1;
        self.rebuild_crl(&mut state);
        Ok(())
    }

    async fn revoke(&self, _pki_path: &str, serial_number: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(limit) = state.fail_revoke_after {
            if state.revoke_calls >= limit {
                return Err(PkiError::BackendUnavailable(
                    "injected revoke failure".to_string(),
                ));
            }
        }
        state.revoke_calls += 1;
        state.revoked.push(serial_number.to_string());
        self.rebuild_crl(&mut state);
        Ok(())
    }

    async fn issue(
        &self,
        _pki_path: &str,
        _role: &str,
        common_name: &str,
    ) -> Result<IssuedCertificate> {
        let (params, serial) = {
            let mut state = self.state.lock().unwrap();
            state.issued += 1;
            let serial = 0xa0 + state.issued;
            // Newer than anything the tests seed directly.
            (leaf_params(common_name, serial, (2035, 1, state.issued)), serial)
        };

        let key = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();
        let pem = cert.pem();

        self.state.lock().unwrap().certs.push(StoredCert {
            key: format!("{:02x}", serial),
            pem: pem.clone(),
        });

        Ok(IssuedCertificate {
            certificate_pem: pem,
            private_key_pem: format!("FAKE PRIVATE KEY {:02x}", serial),
            serial_number: format!("{:02x}", serial),
        })
    }

    async fn store_client_config(
        &self,
        kv_path: &str,
        username: &str,
        config_key: &str,
        content: &str,
    ) -> Result<()> {
        self.state.lock().unwrap().stored_configs.insert(
            format!("{}/data/users/{}/{}", kv_path, username, config_key),
            content.to_string(),
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct GatewayState {
    pub crl: Option<String>,
    pub import_calls: usize,
}

pub struct FakeGateway {
    dns_name: String,
    pub state: Mutex<GatewayState>,
}

impl FakeGateway {
    pub fn new(dns_name: &str) -> Self {
        Self {
            dns_name: dns_name.to_string(),
            state: Mutex::new(GatewayState::default()),
        }
    }

    pub fn seed_crl(&self, crl: &str) {
        self.state.lock().unwrap().crl = Some(crl.to_string());
    }

    pub fn import_calls(&self) -> usize {
        self.state.lock().unwrap().import_calls
    }

    pub fn crl(&self) -> Option<String> {
        self.state.lock().unwrap().crl.clone()
    }
}

#[async_trait]
impl VpnGateway for FakeGateway {
    async fn endpoint_dns_name(
        &self,
        _endpoint_id: &str,
    ) -> std::result::Result<String, GatewayError> {
        Ok(self.dns_name.clone())
    }

    async fn export_crl(
        &self,
        _endpoint_id: &str,
    ) -> std::result::Result<Option<String>, GatewayError> {
        Ok(self.state.lock().unwrap().crl.clone())
    }

    async fn import_crl(
        &self,
        _endpoint_id: &str,
        crl_pem: &str,
    ) -> std::result::Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.import_calls += 1;
        state.crl = Some(crl_pem.to_string());
        Ok(())
    }
}

fn leaf_params(common_name: &str, serial: u8, not_before: (i32, u8, u8)) -> CertificateParams {
    let mut params = CertificateParams::default();
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    params.serial_number = Some(SerialNumber::from(vec![serial]));
    params.not_before = date_time_ymd(not_before.0, not_before.1, not_before.2);
    params.not_after = date_time_ymd(2040, 1, 1);
    params
}

fn serial_bytes(serial: &str) -> Vec<u8> {
    serial
        .split('-')
        .map(|part| u8::from_str_radix(part, 16).unwrap())
        .collect()
}
