use crate::application::checkout::PaymentRequest;
use crate::error::Result;
use std::io::Read;

/// Reads a checkout request document from any `Read` source (e.g., File, Stdin).
pub fn read_payment_request<R: Read>(source: R) -> Result<PaymentRequest> {
    Ok(serde_json::from_reader(source)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CheckoutError;

    #[test]
    fn test_reads_request() {
        let data = r#"{ "nonce": "fake-valid-nonce", "cart": [{ "_id": "p1", "price": 20 }] }"#;
        let request = read_payment_request(data.as_bytes()).unwrap();
        assert_eq!(request.nonce.as_str(), "fake-valid-nonce");
        assert!(request.cart.unwrap().is_array());
    }

    #[test]
    fn test_malformed_document() {
        let result = read_payment_request("{ nonce: ".as_bytes());
        assert!(matches!(result, Err(CheckoutError::JsonError(_))));
    }

    #[test]
    fn test_missing_nonce_is_malformed() {
        let result = read_payment_request(r#"{ "cart": [] }"#.as_bytes());
        assert!(matches!(result, Err(CheckoutError::JsonError(_))));
    }
}
