//! User-facing status messages, keyed by locale. Only the service response
//! uses these; detection never sees a locale.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "bn")]
    Bengali,
}

struct Messages {
    processed: &'static str,
    no_duplicates: &'static str,
    duplicates_found: &'static str,
}

const ENGLISH: Messages = Messages {
    processed: "Files processed successfully!",
    no_duplicates: "No duplicates found!",
    duplicates_found: "{count} duplicate entries found!",
};

const HINDI: Messages = Messages {
    processed: "फ़ाइलें सफलतापूर्वक प्रोसेस हो गईं!",
    no_duplicates: "कोई डुप्लिकेट नहीं मिला!",
    duplicates_found: "कुल {count} डुप्लिकेट एंट्री मिली!",
};

const BENGALI: Messages = Messages {
    processed: "ফাইল সফলভাবে প্রক্রিয়া সম্পন্ন হয়েছে!",
    no_duplicates: "কোনো ডুপ্লিকেট পাওয়া যায়নি!",
    duplicates_found: "মোট {count} টি ডুপ্লিকেট পাওয়া গেছে!",
};

impl Locale {
    fn messages(self) -> &'static Messages {
        match self {
            Locale::English => &ENGLISH,
            Locale::Hindi => &HINDI,
            Locale::Bengali => &BENGALI,
        }
    }

    pub fn processed(self) -> &'static str {
        self.messages().processed
    }

    /// Summary line for a run that reported `count` pairs.
    pub fn summary(self, count: usize) -> String {
        if count == 0 {
            self.messages().no_duplicates.to_string()
        } else {
            self.messages()
                .duplicates_found
                .replace("{count}", &count.to_string())
        }
    }
}
