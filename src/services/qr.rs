//! Opaque QR payloads for booking receipts.
//!
//! The payload is canonical JSON wrapped in base64; scanners hand the string
//! back to the API, which decodes it losslessly. Rendering the actual QR
//! image is a client concern.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Fields embedded in a booking's QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QrPayload {
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub location_id: Uuid,
    pub slot_number: String,
    pub vehicle_number: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub amount: Decimal,
}

/// Encode a payload into its opaque wire form.
pub fn encode(payload: &QrPayload) -> Result<String, ServiceError> {
    let json = serde_json::to_vec(payload)
        .map_err(|e| ServiceError::SerializationError(e.to_string()))?;
    Ok(STANDARD.encode(json))
}

/// Decode an opaque QR string back into its payload.
pub fn decode(encoded: &str) -> Result<QrPayload, ServiceError> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| ServiceError::ValidationError(format!("Invalid QR payload: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ServiceError::ValidationError(format!("Invalid QR payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample() -> QrPayload {
        QrPayload {
            booking_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            slot_number: "A12".to_string(),
            vehicle_number: "KA01AB1234".to_string(),
            start_time: Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap(),
            amount: dec!(150),
        }
    }

    #[test]
    fn decode_inverts_encode() {
        let payload = sample();
        let encoded = encode(&payload).unwrap();
        assert_eq!(decode(&encoded).unwrap(), payload);
    }

    #[test]
    fn payload_is_opaque_not_plain_json() {
        let encoded = encode(&sample()).unwrap();
        assert!(!encoded.contains('{'));
        assert!(serde_json::from_str::<QrPayload>(&encoded).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode("!!!not-base64!!!").is_err());
        // Valid base64, invalid document
        assert!(decode(&STANDARD.encode(b"plain text")).is_err());
    }
}
