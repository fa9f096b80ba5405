//! Messages sent to the enrichment and announcement agents.

use relief_common::UsdEstimate;

use crate::discovery::DiscoveredDisaster;

pub fn geolocation_message(d: &DiscoveredDisaster) -> String {
    format!(
        "🚨 **{}** 🚨 {} 🔗 [Read more]({})",
        d.title, d.description, d.read_more
    )
}

/// The weather agent takes the geolocation output as a JSON block.
pub fn weather_message(bounding_box: &str) -> String {
    format!("```json\n{bounding_box}\n```")
}

pub fn assessment_message(d: &DiscoveredDisaster, weather: &str) -> String {
    format!(
        "🌧️ **{}**\n{}\n\n[Read more]({})\n\n{}",
        d.title, d.description, d.read_more, weather
    )
}

pub fn tweet_text(d: &DiscoveredDisaster, amount: UsdEstimate) -> String {
    format!(
        "🚨 {} 🚨\n\n📝 {}\n\n💸 Amount required: ${}\n\n🔗 Read more: {}",
        d.title, d.description, amount, d.read_more
    )
}

pub fn announcement_message(tweet: &str) -> String {
    format!("post this content on twitter \"{tweet}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flood() -> DiscoveredDisaster {
        DiscoveredDisaster {
            title: "Valencia floods".into(),
            description: "Flash floods".into(),
            read_more: "https://example.com/floods".into(),
            location: "Valencia".into(),
        }
    }

    #[test]
    fn geolocation_message_shape() {
        assert_eq!(
            geolocation_message(&flood()),
            "🚨 **Valencia floods** 🚨 Flash floods 🔗 [Read more](https://example.com/floods)"
        );
    }

    #[test]
    fn weather_message_is_fenced() {
        assert_eq!(weather_message("{\"bbox\": []}"), "```json\n{\"bbox\": []}\n```");
    }

    #[test]
    fn tweet_shows_unknown_amount() {
        let tweet = tweet_text(&flood(), UsdEstimate::Unknown);
        assert!(tweet.contains("💸 Amount required: $Unknown"));
        let tweet = tweet_text(&flood(), UsdEstimate::Amount(5000));
        assert!(tweet.contains("💸 Amount required: $5000"));
        assert!(tweet.ends_with("🔗 Read more: https://example.com/floods"));
    }

    #[test]
    fn announcement_quotes_tweet() {
        assert_eq!(announcement_message("hi"), "post this content on twitter \"hi\"");
    }
}
