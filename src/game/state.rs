use std::collections::HashSet;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 一条题目：端口、协议与提示。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct QuestionRecord {
    pub port: String,
    pub protocol: String,
    #[serde(default)]
    pub hint: String,
}

impl QuestionRecord {
    pub fn new(
        port: impl Into<String>,
        protocol: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self {
            port: port.into(),
            protocol: protocol.into(),
            hint: hint.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("question set is empty")]
    Empty,
    #[error("record {index} has an empty port or protocol")]
    BlankField { index: usize },
    #[error("port {port} appears more than once")]
    DuplicatePort { port: String },
    #[error("protocol {protocol} appears more than once")]
    DuplicateProtocol { protocol: String },
}

/// 题库。只允许整体洗牌，不支持增删。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct QuestionSet {
    records: Vec<QuestionRecord>,
}

impl QuestionSet {
    /// 原样保留记录，不做校验。
    pub fn new(records: Vec<QuestionRecord>) -> Self {
        Self { records }
    }

    /// 去掉端口/协议两端的空白，丢弃空字段和重复的端口/协议（保留首次出现），
    /// 返回题库与被丢弃的条数。
    pub fn sanitized(records: Vec<QuestionRecord>) -> (Self, usize) {
        let total = records.len();
        let mut ports = HashSet::new();
        let mut protocols = HashSet::new();
        let kept: Vec<QuestionRecord> = records
            .into_iter()
            .filter_map(|record| {
                let port = record.port.trim();
                let protocol = record.protocol.trim();
                if port.is_empty() || protocol.is_empty() {
                    return None;
                }
                if ports.contains(port) || protocols.contains(protocol) {
                    return None;
                }
                ports.insert(port.to_string());
                protocols.insert(protocol.to_string());
                Some(QuestionRecord::new(port, protocol, record.hint))
            })
            .collect();
        let dropped = total - kept.len();
        (Self { records: kept }, dropped)
    }

    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&QuestionRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.records.shuffle(rng);
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        if self.records.is_empty() {
            return Err(IntegrityError::Empty);
        }
        let mut ports = HashSet::new();
        let mut protocols = HashSet::new();
        for (index, record) in self.records.iter().enumerate() {
            if record.port.trim().is_empty() || record.protocol.trim().is_empty() {
                return Err(IntegrityError::BlankField { index });
            }
            if !ports.insert(record.port.as_str()) {
                return Err(IntegrityError::DuplicatePort {
                    port: record.port.clone(),
                });
            }
            if !protocols.insert(record.protocol.as_str()) {
                return Err(IntegrityError::DuplicateProtocol {
                    protocol: record.protocol.clone(),
                });
            }
        }
        Ok(())
    }

    /// 内置的常用端口题库，便于前端调试和测试。
    pub fn sample() -> Self {
        let records = [
            ("20", "FTP-DATA", "File transfer data channel"),
            ("21", "FTP", "File transfer control channel"),
            ("22", "SSH", "Encrypted remote shell"),
            ("23", "Telnet", "Unencrypted remote terminal"),
            ("25", "SMTP", "Sending mail between servers"),
            ("53", "DNS", "Resolves names to addresses"),
            ("67", "DHCP", "Hands out IP addresses"),
            ("69", "TFTP", "Trivial file transfer over UDP"),
            ("80", "HTTP", "Plain web traffic"),
            ("110", "POP3", "Downloading mail from a mailbox"),
            ("123", "NTP", "Clock synchronization"),
            ("143", "IMAP", "Reading mail kept on the server"),
            ("161", "SNMP", "Monitoring network devices"),
            ("389", "LDAP", "Directory lookups"),
            ("443", "HTTPS", "Secure web traffic"),
            ("445", "SMB", "Windows file sharing"),
            ("3389", "RDP", "Windows remote desktop"),
        ];
        Self::new(
            records
                .into_iter()
                .map(|(port, protocol, hint)| QuestionRecord::new(port, protocol, hint))
                .collect(),
        )
    }
}

impl From<Vec<QuestionRecord>> for QuestionSet {
    fn from(records: Vec<QuestionRecord>) -> Self {
        Self::new(records)
    }
}

/// 出题方向。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum QuizVariation {
    #[default]
    PortToProtocol,
    ProtocolToPort,
}

impl QuizVariation {
    pub fn prompt(self, record: &QuestionRecord) -> String {
        match self {
            QuizVariation::PortToProtocol => {
                format!("What protocol uses port {}?", record.port)
            }
            QuizVariation::ProtocolToPort => {
                format!("What port does {} use?", record.protocol)
            }
        }
    }

    /// 作为答案的字段值。
    pub fn answer(self, record: &QuestionRecord) -> &str {
        match self {
            QuizVariation::PortToProtocol => &record.protocol,
            QuizVariation::ProtocolToPort => &record.port,
        }
    }

    /// 填空题判定：协议名忽略大小写，端口号精确匹配。
    pub fn accepts_typed(self, typed: &str, correct: &str) -> bool {
        let typed = typed.trim();
        match self {
            QuizVariation::PortToProtocol => typed.to_uppercase() == correct.to_uppercase(),
            QuizVariation::ProtocolToPort => typed == correct,
        }
    }
}

impl FromStr for QuizVariation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "port-to-protocol" | "port_to_protocol" | "porttoprotocol" => {
                Ok(QuizVariation::PortToProtocol)
            }
            "protocol-to-port" | "protocol_to_port" | "protocoltoport" => {
                Ok(QuizVariation::ProtocolToPort)
            }
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn web_pair() -> Vec<QuestionRecord> {
        vec![
            QuestionRecord::new("80", "HTTP", "web"),
            QuestionRecord::new("443", "HTTPS", "secure web"),
        ]
    }

    #[test]
    fn prompts_follow_variation() {
        let record = &web_pair()[0];
        assert_eq!(
            QuizVariation::PortToProtocol.prompt(record),
            "What protocol uses port 80?"
        );
        assert_eq!(
            QuizVariation::ProtocolToPort.prompt(record),
            "What port does HTTP use?"
        );
        assert_eq!(QuizVariation::PortToProtocol.answer(record), "HTTP");
        assert_eq!(QuizVariation::ProtocolToPort.answer(record), "80");
    }

    #[test]
    fn typed_answers_compare_by_field() {
        let variation = QuizVariation::PortToProtocol;
        assert!(variation.accepts_typed("  http ", "HTTP"));
        assert!(variation.accepts_typed("Http", "HTTP"));
        assert!(!variation.accepts_typed("ftp", "HTTP"));

        let variation = QuizVariation::ProtocolToPort;
        assert!(variation.accepts_typed(" 443", "443"));
        assert!(!variation.accepts_typed("0443", "443"));
    }

    #[test]
    fn sanitized_drops_duplicates_and_blanks() {
        let mut records = web_pair();
        records.push(QuestionRecord::new("8080", "HTTP", "alt web"));
        records.push(QuestionRecord::new("443", "QUIC", "udp web"));
        records.push(QuestionRecord::new(" ", "GOPHER", "blank port"));

        let (set, dropped) = QuestionSet::sanitized(records);
        assert_eq!(dropped, 3);
        assert_eq!(set.records(), web_pair().as_slice());
        assert_eq!(set.integrity_check(), Ok(()));
    }

    #[test]
    fn sanitized_stores_trimmed_fields() {
        let (set, dropped) = QuestionSet::sanitized(vec![
            QuestionRecord::new(" 80", "HTTP ", "web"),
            QuestionRecord::new("80 ", "WWW", "same port once trimmed"),
        ]);
        assert_eq!(dropped, 1);
        let record = set.get(0).expect("first record kept");
        assert_eq!(record, &QuestionRecord::new("80", "HTTP", "web"));

        let variation = QuizVariation::ProtocolToPort;
        assert!(variation.accepts_typed("80", variation.answer(record)));
        assert_eq!(variation.prompt(record), "What port does HTTP use?");
    }

    #[test]
    fn integrity_check_reports_first_problem() {
        assert_eq!(QuestionSet::default().integrity_check(), Err(IntegrityError::Empty));

        let mut records = web_pair();
        records.push(QuestionRecord::new("80", "WWW", "dup"));
        assert_eq!(
            QuestionSet::new(records).integrity_check(),
            Err(IntegrityError::DuplicatePort { port: "80".into() })
        );
    }

    #[test]
    fn sample_set_is_valid() {
        let set = QuestionSet::sample();
        assert!(set.len() >= 12);
        assert_eq!(set.integrity_check(), Ok(()));
    }

    #[test]
    fn variation_parses_wire_names() {
        assert_eq!(
            QuizVariation::from_str("protocol-to-port"),
            Ok(QuizVariation::ProtocolToPort)
        );
        let json = serde_json::to_string(&QuizVariation::PortToProtocol).expect("serialize");
        assert_eq!(json, "\"port-to-protocol\"");
    }

    #[test]
    fn question_set_deserializes_from_endpoint_payload() {
        let payload = r#"[{"port":"80","protocol":"HTTP","hint":"web"},{"port":"22","protocol":"SSH"}]"#;
        let set: QuestionSet = serde_json::from_str(payload).expect("payload should parse");
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).map(|record| record.hint.as_str()), Some(""));
    }
}
