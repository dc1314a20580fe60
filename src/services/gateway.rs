//! MoMo payment gateway orchestrator.
//!
//! Builds HMAC-SHA256 signed charge-creation requests and verifies signed
//! IPN callbacks. The gateway deduplicates on `orderId`/`requestId`, so a
//! fresh random pair is generated per attempt rather than derived from the
//! booking.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::json;
use sha2::Sha256;
use std::time::Duration;
use uuid::Uuid;

use crate::{
    config::MomoConfig,
    error::{AppError, AppResult},
    models::payment::{GatewayResponse, MomoCallback},
};

type HmacSha256 = Hmac<Sha256>;

/// A charge to submit to the gateway
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub amount: Decimal,
    pub order_info: String,
    /// Threaded through the gateway's opaque extraData field; the callback
    /// path has no other way to know which payment position this settles.
    pub is_deposit: bool,
}

/// Outcome of a charge submission, carrying the gateway order id the
/// payment row is keyed on for callback reconciliation.
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    pub order_id: String,
    pub request_id: String,
    pub response: GatewayResponse,
}

/// Payment gateway seam. Mocked in service tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submit a signed charge-creation request. A transport error or
    /// timeout is an unknown outcome and maps to GatewayUnavailable; the
    /// caller must leave the local payment PENDING in that case.
    async fn create_charge(&self, request: &ChargeRequest) -> AppResult<ChargeOutcome>;

    /// Verify the signature of an IPN callback. Mismatch is an error and
    /// must not mutate any state.
    fn verify_callback(&self, callback: &MomoCallback) -> AppResult<()>;
}

#[derive(Clone)]
pub struct MomoGateway {
    config: MomoConfig,
    client: reqwest::Client,
}

impl MomoGateway {
    pub fn new(config: MomoConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl PaymentGateway for MomoGateway {
    async fn create_charge(&self, request: &ChargeRequest) -> AppResult<ChargeOutcome> {
        let order_id = Uuid::new_v4().to_string();
        let request_id = Uuid::new_v4().to_string();
        let amount = amount_minor_units(request.amount)?;
        let extra_data = request.is_deposit.to_string();

        let raw_signature = creation_raw_signature(
            &self.config.access_key,
            amount,
            &extra_data,
            &self.config.ipn_url,
            &order_id,
            &request.order_info,
            &self.config.partner_code,
            &self.config.redirect_url,
            &request_id,
        );
        let signature = hmac_sha256_hex(&raw_signature, &self.config.secret_key)?;

        let body = json!({
            "partnerCode": self.config.partner_code,
            "partnerName": self.config.partner_name,
            "storeId": self.config.store_id,
            "requestId": request_id,
            "amount": amount,
            "orderId": order_id,
            "orderInfo": request.order_info,
            "redirectUrl": self.config.redirect_url,
            "ipnUrl": self.config.ipn_url,
            "lang": "vi",
            "extraData": extra_data,
            "requestType": "captureWallet",
            "signature": signature,
        });

        tracing::info!("Submitting gateway charge - orderId: {}, amount: {}", order_id, amount);

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                // Timeout or transport failure: the charge may still have
                // gone through, only the callback can tell.
                AppError::GatewayUnavailable(format!("Gateway request failed: {}", e))
            })?;

        let gateway_response: GatewayResponse = response.json().await.map_err(|e| {
            AppError::GatewayUnavailable(format!("Unreadable gateway response: {}", e))
        })?;

        tracing::info!(
            "Gateway charge response - resultCode: {}, orderId: {}",
            gateway_response.result_code,
            gateway_response.order_id
        );

        Ok(ChargeOutcome {
            order_id,
            request_id,
            response: gateway_response,
        })
    }

    fn verify_callback(&self, callback: &MomoCallback) -> AppResult<()> {
        let raw_signature = callback_raw_signature(&self.config.access_key, callback);
        let claimed = hex::decode(&callback.signature).map_err(|_| {
            AppError::GatewaySignature(format!(
                "Malformed signature for orderId {}",
                callback.order_id
            ))
        })?;

        let mut mac = HmacSha256::new_from_slice(self.config.secret_key.as_bytes())
            .map_err(|e| AppError::Internal(format!("Invalid HMAC key: {}", e)))?;
        mac.update(raw_signature.as_bytes());

        // Constant-time comparison; a plain == would leak a timing oracle
        // on this unauthenticated endpoint.
        mac.verify_slice(&claimed).map_err(|_| {
            AppError::GatewaySignature(format!(
                "Signature mismatch for orderId {}",
                callback.order_id
            ))
        })
    }
}

/// Canonical parameter string for the charge-creation signature. Key order
/// is fixed by the gateway contract.
#[allow(clippy::too_many_arguments)]
fn creation_raw_signature(
    access_key: &str,
    amount: i64,
    extra_data: &str,
    ipn_url: &str,
    order_id: &str,
    order_info: &str,
    partner_code: &str,
    redirect_url: &str,
    request_id: &str,
) -> String {
    format!(
        "accessKey={}&amount={}&extraData={}&ipnUrl={}&orderId={}&orderInfo={}&partnerCode={}&redirectUrl={}&requestId={}&requestType=captureWallet",
        access_key, amount, extra_data, ipn_url, order_id, order_info, partner_code, redirect_url, request_id
    )
}

/// Canonical parameter string for the callback signature. Key order
/// differs from the creation request; missing extraData signs as the empty
/// string.
fn callback_raw_signature(access_key: &str, cb: &MomoCallback) -> String {
    let extra_data = cb.extra_data.as_deref().unwrap_or("");
    format!(
        "accessKey={}&amount={}&extraData={}&message={}&orderId={}&orderInfo={}&orderType={}&partnerCode={}&payType={}&requestId={}&responseTime={}&resultCode={}&transId={}",
        access_key,
        cb.amount,
        extra_data,
        cb.message,
        cb.order_id,
        cb.order_info,
        cb.order_type,
        cb.partner_code,
        cb.pay_type,
        cb.request_id,
        cb.response_time,
        cb.result_code,
        cb.trans_id
    )
}

fn hmac_sha256_hex(data: &str, secret: &str) -> AppResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("Invalid HMAC key: {}", e)))?;
    mac.update(data.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Gateway amounts are integer minor units
fn amount_minor_units(amount: Decimal) -> AppResult<i64> {
    amount
        .trunc()
        .to_i64()
        .ok_or_else(|| AppError::Validation(format!("Amount {} out of range", amount)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_config() -> MomoConfig {
        MomoConfig {
            partner_code: "MOMOTEST".to_string(),
            partner_name: "EV Rental".to_string(),
            store_id: "EVRental".to_string(),
            access_key: "accesskey".to_string(),
            secret_key: "secretkey".to_string(),
            endpoint: "https://test-payment.momo.vn/v2/gateway/api/create".to_string(),
            redirect_url: "https://evrental.example/return".to_string(),
            ipn_url: "https://evrental.example/api/v1/payments/momo/callback".to_string(),
            request_timeout_secs: 10,
        }
    }

    fn test_callback() -> MomoCallback {
        MomoCallback {
            partner_code: "MOMOTEST".to_string(),
            order_id: "order-1".to_string(),
            request_id: "req-1".to_string(),
            amount: 200000,
            order_info: "Deposit for booking BK1".to_string(),
            order_type: "momo_wallet".to_string(),
            trans_id: 4088878653,
            result_code: "0".to_string(),
            message: "Successful.".to_string(),
            pay_type: "qr".to_string(),
            response_time: 1700000000000,
            extra_data: Some("true".to_string()),
            signature: String::new(),
        }
    }

    #[test]
    fn test_hmac_sha256_rfc4231_vector() {
        // RFC 4231 test case 2
        let mac = hmac_sha256_hex("what do ya want for nothing?", "Jefe").unwrap();
        assert_eq!(
            mac,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_creation_raw_signature_key_order() {
        let raw = creation_raw_signature(
            "ak", 200000, "true", "https://ipn", "oid", "info", "pc", "https://redir", "rid",
        );
        assert_eq!(
            raw,
            "accessKey=ak&amount=200000&extraData=true&ipnUrl=https://ipn&orderId=oid&orderInfo=info&partnerCode=pc&redirectUrl=https://redir&requestId=rid&requestType=captureWallet"
        );
    }

    #[test]
    fn test_callback_raw_signature_key_order() {
        let cb = test_callback();
        let raw = callback_raw_signature("ak", &cb);
        assert_eq!(
            raw,
            "accessKey=ak&amount=200000&extraData=true&message=Successful.&orderId=order-1&orderInfo=Deposit for booking BK1&orderType=momo_wallet&partnerCode=MOMOTEST&payType=qr&requestId=req-1&responseTime=1700000000000&resultCode=0&transId=4088878653"
        );
    }

    #[test]
    fn test_callback_missing_extra_data_signs_empty() {
        let mut cb = test_callback();
        cb.extra_data = None;
        let raw = callback_raw_signature("ak", &cb);
        assert!(raw.contains("&extraData=&message="));
    }

    #[test]
    fn test_verify_callback_roundtrip() {
        let gateway = MomoGateway::new(test_config()).unwrap();
        let mut cb = test_callback();
        let raw = callback_raw_signature("accesskey", &cb);
        cb.signature = hmac_sha256_hex(&raw, "secretkey").unwrap();

        assert!(gateway.verify_callback(&cb).is_ok());
    }

    #[test]
    fn test_verify_callback_rejects_tampered_amount() {
        let gateway = MomoGateway::new(test_config()).unwrap();
        let mut cb = test_callback();
        let raw = callback_raw_signature("accesskey", &cb);
        cb.signature = hmac_sha256_hex(&raw, "secretkey").unwrap();
        cb.amount = 1;

        assert!(matches!(
            gateway.verify_callback(&cb),
            Err(AppError::GatewaySignature(_))
        ));
    }

    #[test]
    fn test_verify_callback_rejects_wrong_signature() {
        let gateway = MomoGateway::new(test_config()).unwrap();
        let mut cb = test_callback();
        cb.signature = "deadbeef".to_string();

        assert!(matches!(
            gateway.verify_callback(&cb),
            Err(AppError::GatewaySignature(_))
        ));
    }

    #[test]
    fn test_verify_callback_rejects_non_hex_signature() {
        let gateway = MomoGateway::new(test_config()).unwrap();
        let mut cb = test_callback();
        cb.signature = "not-a-hex-signature!".to_string();

        assert!(matches!(
            gateway.verify_callback(&cb),
            Err(AppError::GatewaySignature(_))
        ));
    }

    #[test]
    fn test_amount_minor_units_truncates() {
        assert_eq!(amount_minor_units(dec!(200000)).unwrap(), 200000);
        assert_eq!(amount_minor_units(dec!(200000.75)).unwrap(), 200000);
    }
}
