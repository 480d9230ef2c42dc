use crate::domain::payment::{PaymentRequest, PaymentStatus};
use crate::error::Result;
use std::io::Write;

/// Writes the payment history as CSV to any `Write` sink (stdout, file).
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_payments(&mut self, payments: &[PaymentRequest]) -> Result<()> {
        self.writer
            .write_record(["id", "amount", "vendor", "status", "requester"])
            .map_err(csv_io)?;
        for payment in payments {
            let status = match payment.status {
                PaymentStatus::Pending => "pending",
                PaymentStatus::Approved => "approved",
                PaymentStatus::Rejected => "rejected",
                PaymentStatus::Paid => "paid",
            };
            self.writer
                .write_record([
                    payment.id.to_string(),
                    payment.amount.value().to_string(),
                    payment.vendor.clone(),
                    status.to_string(),
                    payment.requester.clone(),
                ])
                .map_err(csv_io)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

fn csv_io(err: csv::Error) -> crate::error::WorkflowError {
    std::io::Error::other(err).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::Amount;
    use rust_decimal_macros::dec;

    #[test]
    fn test_csv_output_shape() {
        let mut paid = PaymentRequest::new(
            1,
            Amount::new(dec!(250.00)).unwrap(),
            "Vendor X",
            "desc",
            "Alice",
        )
        .unwrap();
        paid.approve("Bob").unwrap();
        paid.mark_paid().unwrap();

        let mut buffer = Vec::new();
        ReportWriter::new(&mut buffer)
            .write_payments(&[paid])
            .unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("id,amount,vendor,status,requester"));
        assert!(text.contains("1,250.00,Vendor X,paid,Alice"));
    }
}
