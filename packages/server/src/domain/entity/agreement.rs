//! Vote averaging and agreement scoring.
//!
//! Two scorings exist side by side:
//!
//! - the live room buckets the coefficient of variation (`stddev / mean * 100`)
//! - the session ledger buckets the average relative absolute deviation
//!   (`mean(|v - mean| / mean)`) and has an extra "low" bucket
//!
//! Both are visible to clients (room snapshots and ledger summaries), so each
//! keeps its own thresholds.

use serde::Serialize;

/// Qualitative agreement bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgreementLevel {
    Full,
    Excellent,
    Good,
    Mixed,
    Low,
    WideSpread,
}

impl AgreementLevel {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Full => "🎯",
            Self::Excellent => "🔥",
            Self::Good => "👍",
            Self::Mixed => "🤔",
            Self::Low => "😬",
            Self::WideSpread => "💥",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Full => "Full agreement",
            Self::Excellent => "Excellent agreement",
            Self::Good => "Good agreement",
            Self::Mixed => "Mixed opinions",
            Self::Low => "Low agreement",
            Self::WideSpread => "Wide spread",
        }
    }

    pub fn agreement(self) -> Agreement {
        Agreement {
            symbol: self.symbol().to_string(),
            description: self.description().to_string(),
        }
    }
}

/// Symbol + description pair shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Agreement {
    pub symbol: String,
    pub description: String,
}

impl From<AgreementLevel> for Agreement {
    fn from(level: AgreementLevel) -> Self {
        level.agreement()
    }
}

/// Round `value` to `decimals` decimal places (half away from zero).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn mean(votes: &[f64]) -> Option<f64> {
    if votes.is_empty() {
        return None;
    }
    Some(votes.iter().sum::<f64>() / votes.len() as f64)
}

fn all_equal(votes: &[f64]) -> bool {
    votes.windows(2).all(|pair| pair[0] == pair[1])
}

/// Average rounded to one decimal, `None` when there is no vote.
pub fn rounded_average(votes: &[f64]) -> Option<f64> {
    mean(votes).map(|m| round_to(m, 1))
}

/// Coefficient of variation in percent (population standard deviation).
///
/// Zero when the mean is zero, which only happens when every vote sits on
/// the zero point of the scale.
pub fn coefficient_of_variation(votes: &[f64]) -> Option<f64> {
    let m = mean(votes)?;
    if m == 0.0 {
        return Some(0.0);
    }
    let variance = votes.iter().map(|v| (v - m).powi(2)).sum::<f64>() / votes.len() as f64;
    Some(variance.sqrt() / m * 100.0)
}

/// Live room scoring.
pub fn room_agreement(votes: &[f64]) -> Option<AgreementLevel> {
    let cv = coefficient_of_variation(votes)?;
    // Identical votes are full agreement even when float noise leaves cv > 0.
    let level = if cv == 0.0 || all_equal(votes) {
        AgreementLevel::Full
    } else if cv <= 15.0 {
        AgreementLevel::Excellent
    } else if cv <= 30.0 {
        AgreementLevel::Good
    } else if cv <= 50.0 {
        AgreementLevel::Mixed
    } else {
        AgreementLevel::WideSpread
    };
    Some(level)
}

/// Average of `|v - mean| / mean`.
pub fn average_relative_deviation(votes: &[f64]) -> Option<f64> {
    let m = mean(votes)?;
    if m == 0.0 {
        return Some(0.0);
    }
    Some(votes.iter().map(|v| (v - m).abs() / m).sum::<f64>() / votes.len() as f64)
}

/// Session ledger scoring.
pub fn ledger_agreement(votes: &[f64]) -> Option<AgreementLevel> {
    let deviation = average_relative_deviation(votes)?;
    let level = if all_equal(votes) {
        AgreementLevel::Full
    } else if deviation < 0.1 {
        AgreementLevel::Excellent
    } else if deviation < 0.2 {
        AgreementLevel::Good
    } else if deviation < 0.4 {
        AgreementLevel::Mixed
    } else if deviation < 0.6 {
        AgreementLevel::Low
    } else {
        AgreementLevel::WideSpread
    };
    Some(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_average_one_decimal() {
        // テスト項目: [1,2,3,5] の平均は 2.8 に丸められる
        // given (前提条件):
        let votes = [1.0, 2.0, 3.0, 5.0];

        // when (操作):
        let average = rounded_average(&votes);

        // then (期待する結果):
        assert_eq!(average, Some(2.8));
    }

    #[test]
    fn test_rounded_average_empty() {
        // テスト項目: 投票がなければ平均は None
        // given (前提条件):
        let votes: [f64; 0] = [];

        // when (操作) / then (期待する結果):
        assert_eq!(rounded_average(&votes), None);
        assert_eq!(room_agreement(&votes), None);
        assert_eq!(ledger_agreement(&votes), None);
    }

    #[test]
    fn test_room_agreement_all_equal_is_full() {
        // テスト項目: 全員同じ投票なら CV 方式で完全一致になる
        // given (前提条件):
        let votes = [1.0, 1.0, 1.0];

        // when (操作):
        let level = room_agreement(&votes);

        // then (期待する結果):
        assert_eq!(level, Some(AgreementLevel::Full));
    }

    #[test]
    fn test_room_agreement_all_zero_is_full() {
        // テスト項目: 全員 0 の場合は平均 0 でも完全一致として扱われる
        // given (前提条件):
        let votes = [0.0, 0.0];

        // when (操作) / then (期待する結果):
        assert_eq!(coefficient_of_variation(&votes), Some(0.0));
        assert_eq!(room_agreement(&votes), Some(AgreementLevel::Full));
    }

    #[test]
    fn test_room_agreement_buckets() {
        // テスト項目: CV の値に応じてバケットが選ばれる
        // given (前提条件): 母標準偏差で計算した CV
        // [9, 11]   -> cv = 10%
        // [4, 6]    -> cv = 20%
        // [3, 5]    -> cv = 25%
        // [2, 4]    -> cv ≈ 33%
        // [1, 5]    -> cv ≈ 66%

        // when (操作) / then (期待する結果):
        assert_eq!(room_agreement(&[9.0, 11.0]), Some(AgreementLevel::Excellent));
        assert_eq!(room_agreement(&[4.0, 6.0]), Some(AgreementLevel::Good));
        assert_eq!(room_agreement(&[3.0, 5.0]), Some(AgreementLevel::Good));
        assert_eq!(room_agreement(&[2.0, 4.0]), Some(AgreementLevel::Mixed));
        assert_eq!(room_agreement(&[1.0, 5.0]), Some(AgreementLevel::WideSpread));
    }

    #[test]
    fn test_ledger_agreement_buckets() {
        // テスト項目: 平均相対偏差の値に応じてバケットが選ばれる
        // given (前提条件):
        // [19, 21] -> 0.05, [17, 23] -> 0.15, [7, 13] -> 0.3, [5, 15] -> 0.5, [1, 9] -> 0.8

        // when (操作) / then (期待する結果):
        assert_eq!(ledger_agreement(&[5.0, 5.0]), Some(AgreementLevel::Full));
        assert_eq!(ledger_agreement(&[19.0, 21.0]), Some(AgreementLevel::Excellent));
        assert_eq!(ledger_agreement(&[17.0, 23.0]), Some(AgreementLevel::Good));
        assert_eq!(ledger_agreement(&[7.0, 13.0]), Some(AgreementLevel::Mixed));
        assert_eq!(ledger_agreement(&[5.0, 15.0]), Some(AgreementLevel::Low));
        assert_eq!(ledger_agreement(&[1.0, 9.0]), Some(AgreementLevel::WideSpread));
    }

    #[test]
    fn test_round_to_two_decimals() {
        // テスト項目: 小数第2位への丸め
        // given (前提条件):
        let value = 7.0 / 3.0;

        // when (操作):
        let rounded = round_to(value, 2);

        // then (期待する結果):
        assert_eq!(rounded, 2.33);
    }
}
