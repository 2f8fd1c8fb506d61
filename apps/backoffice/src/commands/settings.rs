//! # Settings Commands
//!
//! Per-account preferences that outlive a session.

use tracing::info;

use crate::error::ApiError;
use crate::state::{DbState, SessionContext};
use dukan_core::Locale;

/// Stores the display language on the account and switches the live
/// session to it. Later sessions pick it up via
/// [`SessionContext::for_account`].
pub async fn set_locale(
    db: &DbState,
    session: &mut SessionContext,
    locale: Locale,
) -> Result<(), ApiError> {
    db.inner().accounts().set_locale(&session.account_id, locale).await?;
    session.locale = locale;

    info!(account_id = %session.account_id, locale = ?locale, "Locale changed");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::product::list_products;
    use crate::commands::test_support::{test_db, test_product, test_session};
    use crate::error::ErrorCode;
    use crate::state::ConfigState;
    use chrono::Utc;
    use dukan_core::SubscriptionTier;

    #[tokio::test]
    async fn test_locale_persists_and_localizes_names() {
        let db = test_db().await;
        let (account, mut session) = test_session(&db, SubscriptionTier::Free).await;

        let mut product = test_product(&db, &account.id, "Flour", 12_000, 9_000, 10).await;
        product.name_ur = Some("آٹا".to_string());
        db.inner().products().update(&product).await.unwrap();

        set_locale(&db, &mut session, Locale::Ur).await.unwrap();
        assert_eq!(session.locale, Locale::Ur);

        let listed = list_products(&db, &session, Utc::now()).await.unwrap();
        assert_eq!(listed[0].display_name, "آٹا");

        let reloaded = db.inner().accounts().require(&account.id).await.unwrap();
        let fresh = SessionContext::for_account(&reloaded, &ConfigState::default());
        assert_eq!(fresh.locale, Locale::Ur);
    }

    #[tokio::test]
    async fn test_unknown_account_not_found() {
        let db = test_db().await;
        let (_, mut session) = test_session(&db, SubscriptionTier::Free).await;
        session.account_id = "missing".to_string();

        let err = set_locale(&db, &mut session, Locale::Ps).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(session.locale, Locale::En);
    }
}
