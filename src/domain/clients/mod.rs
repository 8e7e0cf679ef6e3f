//! Clients domain - roster, packages, purchases and manual payments.

mod client;
mod manual_payment;
mod package;

pub use client::{Client, ClientDetails, ClientPaymentStatus, FitnessLevel};
pub use manual_payment::{ManualPayment, ManualPaymentDraft, PaymentMethod};
pub use package::{Package, PackagePurchase, PackageTerms};
