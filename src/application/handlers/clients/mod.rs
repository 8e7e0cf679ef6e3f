//! Client roster, packages and manual payments.

mod manage_clients;
mod manage_packages;
mod manual_payments;

pub use manage_clients::{ManageClientsHandler, UpdateClientCommand};
pub use manage_packages::{AssignPackageCommand, ManagePackagesHandler};
pub use manual_payments::{ManualPaymentsHandler, ManualRevenue};

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::domain::foundation::Timestamp;

/// Today's civil date in the trainer's zone.
pub(crate) fn local_today(tz: Tz) -> NaiveDate {
    Timestamp::now().as_datetime().with_timezone(&tz).date_naive()
}
