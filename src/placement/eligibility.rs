// src/placement/eligibility.rs

use chrono::{DateTime, Utc};

use crate::model::campaign::Campaign;
use crate::model::placements::PageType;

/// 是否可以在 now 时刻投放到 page_type 页面
pub fn is_eligible(campaign: &Campaign, page_type: PageType, now: DateTime<Utc>) -> bool {
    campaign.is_active() && campaign.targets_page(page_type) && campaign.is_in_window(now)
}

/// 过滤出可投放的广告活动，并按 priority 降序排序
///
/// priority 相同时按 id 升序，保证相同输入得到相同顺序。
pub fn filter_eligible(campaigns: &[Campaign], page_type: PageType, now: DateTime<Utc>) -> Vec<&Campaign> {
    let mut eligible: Vec<&Campaign> = campaigns
        .iter()
        .filter(|campaign| is_eligible(campaign, page_type, now))
        .collect();
    eligible.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
    eligible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::campaign::CampaignStatus;
    use chrono::Duration;

    fn ids(campaigns: &[&Campaign]) -> Vec<String> {
        campaigns.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn only_active_targeted_in_window_campaigns_pass() {
        let now = Utc::now();
        let campaigns = vec![
            Campaign::new("ok", 1).with_targets(&[PageType::Posts]),
            Campaign::new("paused", 1)
                .with_targets(&[PageType::Posts])
                .with_status(CampaignStatus::Paused),
            Campaign::new("draft", 1)
                .with_targets(&[PageType::Posts])
                .with_status(CampaignStatus::Draft),
            Campaign::new("other-page", 1).with_targets(&[PageType::Challenges]),
            Campaign::new("future", 1)
                .with_targets(&[PageType::Posts])
                .with_window(Some(now + Duration::days(1)), None),
            Campaign::new("expired", 1)
                .with_targets(&[PageType::Posts])
                .with_window(None, Some(now)),
        ];
        assert_eq!(ids(&filter_eligible(&campaigns, PageType::Posts, now)), vec!["ok"]);
    }

    #[test]
    fn sorts_by_priority_then_id() {
        let now = Utc::now();
        let campaigns = vec![
            Campaign::new("b", 5).with_targets(&[PageType::Posts]),
            Campaign::new("c", 10).with_targets(&[PageType::Posts]),
            Campaign::new("a", 5).with_targets(&[PageType::Posts]),
            Campaign::new("d", -1).with_targets(&[PageType::Posts]),
        ];
        assert_eq!(
            ids(&filter_eligible(&campaigns, PageType::Posts, now)),
            vec!["c", "a", "b", "d"]
        );
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(filter_eligible(&[], PageType::Home, Utc::now()).is_empty());
    }
}
