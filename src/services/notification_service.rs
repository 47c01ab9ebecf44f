use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::Mailbox,
    transport::smtp::authentication::Credentials,
};

use crate::{
    config::SmtpConfig,
    db::{DbPool, product_store::ProductStore},
    models::product::Product,
};

/// Products with this many units or fewer on hand are reported
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Outbound notification channel. The SMTP implementation talks to the
/// configured mail relay; tests substitute a recording double.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Delivers notifications to the administrator address over SMTP
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig, admin_email: &str) -> Result<Self, NotifyError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config
                .from
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(config.from.clone()))?,
            to: admin_email
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(admin_email.to_string()))?,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// Fallback when no mail relay is configured: alerts end up in the log
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        tracing::info!(subject, body, "notification (no mail relay configured)");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid mail address: {0}")]
    InvalidAddress(String),
    #[error("Mail transport error: {0}")]
    Transport(String),
}

/// Low-stock notification hook. Stateless: every invocation scans current
/// stock and reports whatever is below the threshold.
pub struct NotificationService {
    products: ProductStore,
    notifier: Arc<dyn Notifier>,
}

impl NotificationService {
    pub fn new(pool: DbPool, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            products: ProductStore::new(pool),
            notifier,
        }
    }

    /// Best-effort sweep: reads nothing but product rows, mutates nothing,
    /// and swallows every failure after logging it. Callers treat this as
    /// a fire-and-forget side effect.
    pub async fn check_low_stock(&self) -> Vec<Product> {
        let low = match self.products.find_low_stock(LOW_STOCK_THRESHOLD).await {
            Ok(products) => products,
            Err(e) => {
                tracing::error!(error = %e, "low-stock scan failed");
                return Vec::new();
            }
        };

        if low.is_empty() {
            return low;
        }

        let body = compose_low_stock_report(&low);
        if let Err(e) = self.notifier.send("Low stock alert", &body).await {
            tracing::warn!(error = %e, "failed to deliver low-stock notification");
        }

        low
    }
}

fn compose_low_stock_report(products: &[Product]) -> String {
    let mut report = format!(
        "The following products have {} units or fewer on hand:\n",
        LOW_STOCK_THRESHOLD
    );
    for product in products {
        report.push_str(&format!(
            "- {} ({}): {} on hand\n",
            product.name, product.code, product.quantity
        ));
    }
    report
}
