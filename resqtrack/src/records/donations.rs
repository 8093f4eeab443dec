use super::model::{parse_number, DonationRecord, NewDonation, Record};
use super::Records;
use crate::error::{ResqError, Result};
use crate::schema::Collection;

impl Records {
    pub fn add_donation(&self, donation: NewDonation) -> Result<DonationRecord> {
        let amount = donation.amount.trim();
        if !amount.is_empty() && !parse_number(amount).is_some_and(|n| n >= 0.0) {
            return Err(ResqError::Validation(format!(
                "amount must be a non-negative number, got '{amount}'"
            )));
        }
        let email = donation.donor_email.trim();
        if !email.is_empty() && !email.contains('@') {
            return Err(ResqError::Validation(format!(
                "donor_email is not an email address: '{email}'"
            )));
        }

        let record = DonationRecord {
            donor_name: donation.donor_name,
            donor_email: email.to_string(),
            amount: amount.to_string(),
            category: donation.category,
            created_at: self.now(),
        };
        self.store
            .append(Collection::Donations.as_str(), record.to_row()?)?;
        log::info!("Recorded donation of {} ({})", record.amount, record.category);
        Ok(record)
    }

    pub fn list_donations(&self) -> Result<Vec<DonationRecord>> {
        self.list()
    }
}
