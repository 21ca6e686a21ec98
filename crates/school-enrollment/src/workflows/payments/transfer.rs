use serde::Serialize;
use url::Url;

use super::PaymentError;
use crate::config::PaymentConfig;
use crate::workflows::admissions::ApplicationId;

/// Vietnamese letters with tone or vowel marks and their unmarked base letter.
const MARKED_LETTERS: &[(&str, char)] = &[
    ("àáảãạăằắẳẵặâầấẩẫậ", 'a'),
    ("ÀÁẢÃẠĂẰẮẲẴẶÂẦẤẨẪẬ", 'A'),
    ("èéẻẽẹêềếểễệ", 'e'),
    ("ÈÉẺẼẸÊỀẾỂỄỆ", 'E'),
    ("ìíỉĩị", 'i'),
    ("ÌÍỈĨỊ", 'I'),
    ("òóỏõọôồốổỗộơờớởỡợ", 'o'),
    ("ÒÓỎÕỌÔỒỐỔỖỘƠỜỚỞỠỢ", 'O'),
    ("ùúủũụưừứửữự", 'u'),
    ("ÙÚỦŨỤƯỪỨỬỮỰ", 'U'),
    ("ỳýỷỹỵ", 'y'),
    ("ỲÝỶỸỴ", 'Y'),
    ("đ", 'd'),
    ("Đ", 'D'),
];

/// Removes Vietnamese diacritics so the text survives bank transfer memos.
///
/// Combining marks (U+0300..U+036F) left over from decomposed input are dropped.
pub fn strip_diacritics(text: &str) -> String {
    text.chars()
        .filter(|ch| !('\u{0300}'..='\u{036f}').contains(ch))
        .map(|ch| {
            MARKED_LETTERS
                .iter()
                .find(|(marked, _)| marked.contains(ch))
                .map(|(_, base)| *base)
                .unwrap_or(ch)
        })
        .collect()
}

/// Bank transfer a parent makes to pay the enrollment fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDetails {
    pub bin: String,
    pub account_no: String,
    pub account_name: String,
    pub amount: u64,
    pub description: String,
}

impl TransferDetails {
    /// The memo is `"{id} {student name without diacritics}"`.
    pub fn for_application(
        config: &PaymentConfig,
        application_id: &ApplicationId,
        student_name: &str,
    ) -> Self {
        Self {
            bin: config.bank_bin.clone(),
            account_no: config.account_no.clone(),
            account_name: config.account_name.clone(),
            amount: config.fee_amount,
            description: format!("{application_id} {}", strip_diacritics(student_name.trim())),
        }
    }

    /// `{base}/{bin}-{account}-compact.png?amount=..&addInfo=..&accountName=..`
    pub fn qr_image_url(&self, base_url: &str) -> Result<Url, PaymentError> {
        let raw = format!(
            "{}/{}-{}-compact.png",
            base_url.trim_end_matches('/'),
            self.bin,
            self.account_no
        );
        let mut url = Url::parse(&raw)?;
        url.query_pairs_mut()
            .append_pair("amount", &self.amount.to_string())
            .append_pair("addInfo", &self.description)
            .append_pair("accountName", &self.account_name);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaymentConfig {
        PaymentConfig {
            bank_bin: "970405".to_string(),
            account_no: "5304205050813".to_string(),
            account_name: "HUA VAN THIEN".to_string(),
            fee_amount: 200_000,
            qr_base_url: "https://img.vietqr.io/image".to_string(),
        }
    }

    #[test]
    fn strips_vietnamese_marks() {
        assert_eq!(strip_diacritics("Nguyễn Văn Đức"), "Nguyen Van Duc");
        assert_eq!(strip_diacritics("Trần Thị Ánh Tuyết"), "Tran Thi Anh Tuyet");
        assert_eq!(strip_diacritics("Lưu Ngọc Hường"), "Luu Ngoc Huong");
        assert_eq!(strip_diacritics("e\u{0301}"), "e");
    }

    #[test]
    fn description_combines_id_and_plain_name() {
        let details = TransferDetails::for_application(
            &config(),
            &ApplicationId("NH25007".to_string()),
            " Phạm Thị Hoà ",
        );
        assert_eq!(details.description, "NH25007 Pham Thi Hoa");
        assert_eq!(details.amount, 200_000);
    }

    #[test]
    fn qr_url_carries_transfer_parameters() {
        let details = TransferDetails::for_application(
            &config(),
            &ApplicationId("NH25001".to_string()),
            "Lê An",
        );
        let url = details
            .qr_image_url("https://img.vietqr.io/image/")
            .expect("valid url");

        assert_eq!(url.path(), "/image/970405-5304205050813-compact.png");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("amount".to_string(), "200000".to_string()),
                ("addInfo".to_string(), "NH25001 Le An".to_string()),
                ("accountName".to_string(), "HUA VAN THIEN".to_string()),
            ]
        );
    }
}
