//! Display-ready summaries built from chain and verification responses.
//!
//! The "assistant" here is a fixed set of heuristics and canned text; it
//! only reads what the router returned.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use crate::api::Mode;

/// Certificate length (after trimming) from which a record counts as detailed.
const DETAIL_THRESHOLD: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainStats {
    pub length: Option<u64>,
    pub health: &'static str,
    pub pending: usize,
}

impl ChainStats {
    /// Reads `length`, `is_valid` and `pending_certificates` from a chain body.
    /// Missing fields show as unknown, not-healthy and zero.
    pub fn from_chain(data: &Value) -> Self {
        let healthy = data.get("is_valid").and_then(Value::as_bool).unwrap_or(false);
        Self {
            length: data.get("length").and_then(Value::as_u64),
            health: if healthy { "Healthy" } else { "Tampered" },
            pending: data
                .get("pending_certificates")
                .and_then(Value::as_array)
                .map_or(0, Vec::len),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Risk {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insight {
    pub summary: &'static str,
    pub confidence: u8,
    pub risk: Risk,
    pub recommendations: Vec<&'static str>,
}

/// Score a verification body against the text that was checked.
pub fn assess(verification: &Value, certificate: &str) -> Insight {
    let valid = verification.get("valid").and_then(Value::as_bool).unwrap_or(false);
    let detailed = certificate.trim().encode_utf16().count() >= DETAIL_THRESHOLD;

    if valid {
        Insight {
            summary: "AI assessment: Certificate pattern is consistent with recorded blockchain entry.",
            confidence: if detailed { 94 } else { 86 },
            risk: if detailed { Risk::Low } else { Risk::Medium },
            recommendations: vec![
                "Store the certificate hash and block index in your portal.",
                "Add issuer digital signatures for stronger proof.",
            ],
        }
    } else {
        Insight {
            summary: "AI assessment: Certificate does not map to a trusted blockchain record.",
            confidence: if detailed { 74 } else { 63 },
            risk: Risk::High,
            recommendations: vec![
                "Re-check certificate text formatting.",
                "Confirm the issuer wrote this certificate on-chain.",
                "Escalate high-risk results for manual review.",
            ],
        }
    }
}

/// Sections the help assistant can explain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Overview,
    ApiSettings,
    IssueCertificate,
    VerifyCertificate,
    BlockchainPanel,
    AiInsights,
    OfflineMode,
    Security,
}

impl HelpTopic {
    pub const ALL: [HelpTopic; 8] = [
        HelpTopic::Overview,
        HelpTopic::ApiSettings,
        HelpTopic::IssueCertificate,
        HelpTopic::VerifyCertificate,
        HelpTopic::BlockchainPanel,
        HelpTopic::AiInsights,
        HelpTopic::OfflineMode,
        HelpTopic::Security,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            HelpTopic::Overview => "overview",
            HelpTopic::ApiSettings => "api-settings",
            HelpTopic::IssueCertificate => "issue-certificate",
            HelpTopic::VerifyCertificate => "verify-certificate",
            HelpTopic::BlockchainPanel => "blockchain-panel",
            HelpTopic::AiInsights => "ai-insights",
            HelpTopic::OfflineMode => "offline-mode",
            HelpTopic::Security => "security",
        }
    }

    pub fn lines(self) -> &'static [&'static str] {
        match self {
            HelpTopic::Overview => &[
                "This app issues and verifies certificate text against blockchain records.",
                "Use Online mode for real backend validation, or Offline Demo for local testing.",
            ],
            HelpTopic::ApiSettings => &[
                "API Settings controls where requests go and which mode you use.",
                "Use Test Connection to confirm backend health, Save URL to persist it, and Reset Default to restore defaults.",
            ],
            HelpTopic::IssueCertificate => &[
                "Issue Certificate writes a certificate hash into a blockchain block.",
                "Use exactly the final certificate text you plan to verify later.",
            ],
            HelpTopic::VerifyCertificate => &[
                "Verify compares the typed certificate text against stored blockchain hashes.",
                "Even spacing/spelling differences can change the hash and fail verification.",
            ],
            HelpTopic::BlockchainPanel => &[
                "Blockchain panel shows current chain data, integrity state, and pending records.",
                "Use Refresh Chain after issuing certificates to confirm new blocks.",
            ],
            HelpTopic::AiInsights => &[
                "AI Assistant Insights gives confidence, risk level, and recommendations.",
                "These insights are heuristic in frontend demo mode and should be treated as advisory.",
            ],
            HelpTopic::OfflineMode => &[
                "Offline Demo Mode runs without backend and stores demo chain data in local storage.",
                "Great for demos, but not secure enough for production verification.",
            ],
            HelpTopic::Security => &[
                "For production, add issuer authentication, digital signatures, and persistent database storage.",
                "Also add API rate limiting, audit logs, and HTTPS deployment.",
            ],
        }
    }
}

impl fmt::Display for HelpTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for HelpTopic {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HelpTopic::ALL
            .into_iter()
            .find(|t| t.slug() == s.trim())
            .ok_or(())
    }
}

pub const NO_EXPLANATION: &str = "No explanation available for this section yet.";

/// Help lines for a topic slug, or a single fallback line.
pub fn explain(topic: &str) -> Vec<&'static str> {
    match topic.parse::<HelpTopic>() {
        Ok(t) => t.lines().to_vec(),
        Err(()) => vec![NO_EXPLANATION],
    }
}

/// Suggested walkthrough for the current mode and chain size.
pub fn next_steps(mode: Mode, chain_len: u64) -> Vec<&'static str> {
    let mut steps = match mode {
        Mode::Offline => vec![
            "You are in Offline Demo mode. Issue 1-2 certificates to build demo data.",
            "Run verification on one valid and one invalid sample to show full flow.",
            "Switch to Online mode when backend is ready for real verification.",
        ],
        Mode::Online => vec![
            "Run Test Connection to confirm backend accessibility.",
            "Issue a certificate, then verify the same text to confirm success path.",
            "Verify a modified/fake version to validate rejection behavior.",
        ],
    };
    if chain_len <= 1 {
        steps.push("Your chain is still near genesis. Add sample records for realistic testing.");
    }
    steps.push("For production: add signatures, auth, and persistent storage.");
    steps
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn chain_stats_read_fields() {
        let stats = ChainStats::from_chain(&json!({
            "length": 3, "is_valid": true, "pending_certificates": ["a"], "chain": []
        }));
        assert_eq!(stats.length, Some(3));
        assert_eq!(stats.health, "Healthy");
        assert_eq!(stats.pending, 1);

        let empty = ChainStats::from_chain(&json!({"error": "boom"}));
        assert_eq!(empty.length, None);
        assert_eq!(empty.health, "Tampered");
        assert_eq!(empty.pending, 0);
    }

    #[test]
    fn assessment_grid() {
        let long = "Alice completed Course X in 2024";
        let short = "Alice";
        let valid = json!({"valid": true});
        let invalid = json!({"valid": false});

        let a = assess(&valid, long);
        assert_eq!((a.confidence, a.risk), (94, Risk::Low));
        assert_eq!(a.recommendations.len(), 2);

        let b = assess(&valid, short);
        assert_eq!((b.confidence, b.risk), (86, Risk::Medium));

        let c = assess(&invalid, long);
        assert_eq!((c.confidence, c.risk), (74, Risk::High));
        assert_eq!(c.recommendations.len(), 3);

        let d = assess(&json!({"error": "x"}), short);
        assert_eq!((d.confidence, d.risk), (63, Risk::High));
    }

    #[test]
    fn detail_threshold_uses_trimmed_text() {
        let padded = format!("   {}   ", "a".repeat(19));
        assert_eq!(assess(&json!({"valid": true}), &padded).confidence, 86);
        assert_eq!(assess(&json!({"valid": true}), &"a".repeat(20)).confidence, 94);
    }

    #[test]
    fn help_topics_resolve() {
        for topic in HelpTopic::ALL {
            assert_eq!(topic.slug().parse::<HelpTopic>(), Ok(topic));
            assert_eq!(explain(topic.slug()).len(), 2);
        }
        assert_eq!(explain("wallets"), vec![NO_EXPLANATION]);
    }

    #[test]
    fn next_steps_depend_on_mode_and_chain_size() {
        let fresh = next_steps(Mode::Offline, 1);
        assert_eq!(fresh.len(), 5);
        assert!(fresh[0].contains("Offline Demo"));

        let grown = next_steps(Mode::Online, 4);
        assert_eq!(grown.len(), 4);
        assert!(grown[0].contains("Test Connection"));
        assert!(grown.last().unwrap().starts_with("For production"));
    }
}
