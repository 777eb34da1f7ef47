//! Payment callback authentication.
//!
//! The gateway signs each successful payment with
//! `HMAC_SHA256(secret, order_id + "|" + payment_id)` and hands the hex digest
//! to the client, which forwards it to us. Verification recomputes the digest
//! and compares in constant time.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Gateway shared secret. Never printed.
#[derive(Clone)]
pub struct PaymentSecret(Zeroizing<Vec<u8>>);

impl PaymentSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PaymentSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PaymentSecret(<redacted>)")
    }
}

/// Stateless HMAC-SHA256 signature checker.
#[derive(Debug, Clone)]
pub struct PaymentVerifier {
    secret: PaymentSecret,
}

impl PaymentVerifier {
    pub fn new(secret: PaymentSecret) -> Self {
        Self { secret }
    }

    /// Hex digest the gateway would produce for this order/payment pair.
    ///
    /// # Examples
    /// ```
    /// use marketplace::domain::{PaymentSecret, PaymentVerifier};
    ///
    /// let verifier = PaymentVerifier::new(PaymentSecret::new("s3cret"));
    /// let signature = verifier.sign("order_1", "pay_1");
    /// assert!(verifier.verify("order_1", "pay_1", &signature));
    /// assert!(!verifier.verify("order_1", "pay_2", &signature));
    /// ```
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        hex::encode(self.digest(order_id, payment_id))
    }

    /// Whether `signature` authenticates the pair. Pure; never logs.
    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let expected = self.sign(order_id, payment_id);
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }

    fn digest(&self, order_id: &str, payment_id: &str) -> Vec<u8> {
        // HMAC accepts keys of any length, so construction cannot fail.
        let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.expose()) else {
            return Vec::new();
        };
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn verifier() -> PaymentVerifier {
        PaymentVerifier::new(PaymentSecret::new("test_key_secret"))
    }

    #[rstest]
    fn digest_matches_known_vector(verifier: PaymentVerifier) {
        let mut mac = HmacSha256::new_from_slice(b"test_key_secret").expect("hmac key");
        mac.update(b"order_A|pay_B");
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(verifier.sign("order_A", "pay_B"), expected);
        assert_eq!(expected.len(), 64);
    }

    #[rstest]
    fn valid_signature_verifies_repeatedly(verifier: PaymentVerifier) {
        let signature = verifier.sign("order_A", "pay_B");
        for _ in 0..3 {
            assert!(verifier.verify("order_A", "pay_B", &signature));
        }
    }

    #[rstest]
    fn flipping_any_character_fails(verifier: PaymentVerifier) {
        let signature = verifier.sign("order_A", "pay_B");
        for (index, original) in signature.char_indices() {
            let replacement = if original == '0' { '1' } else { '0' };
            let mut tampered = signature.clone();
            tampered.replace_range(index..=index, &replacement.to_string());
            assert!(
                !verifier.verify("order_A", "pay_B", &tampered),
                "tampered position {index} verified"
            );
        }
    }

    #[rstest]
    #[case("")]
    #[case("deadbeef")]
    fn wrong_length_signatures_fail(verifier: PaymentVerifier, #[case] signature: &str) {
        assert!(!verifier.verify("order_A", "pay_B", signature));
    }

    #[rstest]
    fn separator_is_part_of_the_message(verifier: PaymentVerifier) {
        let signature = verifier.sign("order_A", "pay_B");
        assert!(!verifier.verify("order_A|", "pay_B", &signature));
        assert!(!verifier.verify("order_Ap", "ay_B", &signature));
    }

    #[rstest]
    fn different_secret_rejects(verifier: PaymentVerifier) {
        let other = PaymentVerifier::new(PaymentSecret::new("another_secret"));
        let signature = other.sign("order_A", "pay_B");
        assert!(!verifier.verify("order_A", "pay_B", &signature));
    }

    #[rstest]
    fn debug_output_hides_secret(verifier: PaymentVerifier) {
        let rendered = format!("{verifier:?}");
        assert!(!rendered.contains("test_key_secret"));
        assert!(rendered.contains("redacted"));
    }
}
