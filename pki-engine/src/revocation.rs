//! Revocation policy over one user's ordered certificates

use crate::backend::PkiBackend;
use crate::error::PkiError;
use crate::{Certificate, Result};
use tracing::info;

/// Revokes certificates from `certs`, which must be ordered oldest to
/// newest. With `revoke_all` unset the newest certificate stays active
/// even when it is already revoked; with it set every certificate is
/// revoked. Already-revoked certificates are skipped, which makes
/// repeated application idempotent.
///
/// The first failing revoke call aborts the pass. Revocations that
/// already happened stay in place; when at least one succeeded the error
/// is surfaced as [`PkiError::PartialRevocation`] so callers know a
/// retry is required.
pub async fn apply(
    backend: &dyn PkiBackend,
    pki_path: &str,
    certs: &[Certificate],
    revoke_all: bool,
) -> Result<()> {
    let keep_newest = usize::from(!revoke_all);
    let Some(end) = certs.len().checked_sub(keep_newest) else {
        return Ok(());
    };

    let mut revoked_now = 0usize;
    for cert in &certs[..end] {
        if cert.revoked {
            continue;
        }

        if let Err(err) = backend.revoke(pki_path, &cert.serial_number).await {
            if revoked_now > 0 {
                return Err(PkiError::PartialRevocation {
                    revoked: revoked_now,
                    source: Box::new(err),
                });
            }
            return Err(err);
        }

        info!("Revoked certificate {}/{}", cert.subject_cn, cert.serial_number);
        revoked_now += 1;
    }

    Ok(())
}
