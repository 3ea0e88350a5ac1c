use tracing::warn;

use crate::codec::ClaimsCodec;
use crate::error::GuardError;
use crate::roles::RoleQuery;
use crate::session::TokenSession;

pub fn ensure_role<C: ClaimsCodec>(
    session: &TokenSession<C>,
    query: &RoleQuery,
) -> Result<(), GuardError> {
    let roles = session.roles();
    if query.evaluate(&roles) {
        return Ok(());
    }

    let required = query.role_names();
    warn!(
        ?required,
        ?roles,
        must_satisfy_all = query.must_satisfy_all(),
        "role_check_failed"
    );
    Err(GuardError::Forbidden { required })
}

/// Require a current token whose issue/expiry window contains now.
pub fn ensure_valid<C: ClaimsCodec>(session: &TokenSession<C>) -> Result<(), GuardError> {
    let Some(token) = session.token() else {
        warn!("token_check_failed: no current token");
        return Err(GuardError::MissingToken);
    };

    if session.is_valid(&token) {
        Ok(())
    } else {
        warn!("token_check_failed: invalid or expired token");
        Err(GuardError::InvalidToken)
    }
}
