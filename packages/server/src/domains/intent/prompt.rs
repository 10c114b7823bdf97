//! Instruction sent to the oracle for one question.

use std::fmt::Write;

use super::models::{CONTACT_ANCHOR, SEARCH_PARTICIPANTS};

/// Origin used when rendering without a configured site.
pub const DEFAULT_SITE_ORIGIN: &str = "https://gbbinfo-jpn.onrender.com";

/// A page the oracle may answer with.
struct Page {
    file: &'static str,
    /// What the page covers; `{year}` is substituted.
    covers: &'static str,
    scroll: &'static [&'static str],
}

const PAGES: &[Page] = &[
    Page {
        file: "japan",
        covers: "GBB{year}に出場する日本代表",
        scroll: &[],
    },
    Page {
        file: "participants",
        covers: "GBB{year}の出場者と辞退者、Wildcard順位、出場者の世界地図、出場者名での検索",
        scroll: &[SEARCH_PARTICIPANTS],
    },
    Page {
        file: "result",
        covers: "GBB{year}の大会結果",
        scroll: &[],
    },
    Page {
        file: "rule",
        covers: "GBB{year}の部門一覧、シード権の条件、ルール、Wildcard結果発表日、審査員",
        scroll: &["category", "seeds", "result_date", "judges"],
    },
    Page {
        file: "stream",
        covers: "GBB{year}当日の配信URL",
        scroll: &[],
    },
    Page {
        file: "ticket",
        covers: "GBB{year}と7toSmokeのチケット、会場",
        scroll: &[],
    },
    Page {
        file: "time_schedule",
        covers: "GBB{year}と7toSmokeのタイムスケジュール、スペシャルSHOWCASE",
        scroll: &["7tosmoke", "showcase"],
    },
    Page {
        file: "top",
        covers: "GBB{year}の開催日、お問い合わせ",
        scroll: &["date", CONTACT_ANCHOR],
    },
    Page {
        file: "wildcards",
        covers: "GBB{year}のWildcard動画一覧",
        scroll: &[],
    },
    Page {
        file: "result_stream",
        covers: "GBB{year}のWildcard結果発表配信",
        scroll: &[],
    },
    Page {
        file: "how_to_plan",
        covers: "現地観戦の計画、注意点、交通手段、ホテル、当日の行動、持ち物",
        scroll: &["transportation", "hotel", "activities", "items"],
    },
    Page {
        file: "about",
        covers: "このwebサイトについて",
        scroll: &[],
    },
    Page {
        file: "7tosmoke",
        covers: "7toSmokeの概要、予選ルール、本戦ルール、最新情報",
        scroll: &["qualifying_rules", "main_event_rules", "latest_info"],
    },
];

/// Render the instruction for `question`, asked in the context of season `year`.
pub fn render_prompt(year: i32, question: &str) -> String {
    render_prompt_for(DEFAULT_SITE_ORIGIN, year, question)
}

/// Same as [`render_prompt`] with an explicit site origin.
pub fn render_prompt_for(origin: &str, year: i32, question: &str) -> String {
    let origin = origin.trim_end_matches('/');
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "# 依頼");
    let _ = writeln!(
        out,
        "Grand Beatbox Battle {year} (GBB{year}) に関心のある人から、次の質問が届きました。"
    );
    let _ = writeln!(out, "「{question}」");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "この質問に最も合うページのURLとクエリパラメータを選んでください。"
    );
    let _ = writeln!(
        out,
        "サイトのURLは {origin}/{year}/ で、ディレクトリは必ず {year} にします。"
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "# 回答のルール");
    let _ = writeln!(out, "URLの末尾には、下のファイル名のどれか1つを付けてください。");
    let _ = writeln!(
        out,
        "クエリパラメータは、そのページのリストから質問に最も合うものを1つだけ選んでください。"
    );
    let _ = writeln!(
        out,
        "質問文にGBBに関係する人名やグループ名があれば、最初のもの1つをアルファベット表記 (例: ROFU, Wing) にして name に入れてください。無ければ None にしてください。"
    );
    let _ = writeln!(out, "リストにないページやパラメータを作ってはいけません。");
    let _ = writeln!(out);

    for page in PAGES {
        let _ = writeln!(out, "- {}: {}", page.file, page.covers.replace("{year}", &year.to_string()));
        let _ = writeln!(out, "    クエリパラメータ");
        let _ = writeln!(out, "    - None");
        for scroll in page.scroll {
            let _ = writeln!(out, "    - {}", scroll);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "合うページが無いときは、ファイル名を top、クエリパラメータを None にしてください。"
    );
    let _ = writeln!(
        out,
        "質問が人名やグループ名 (例: Tomazacre、River') だけでできている、または特定の人物を探していると分かる場合は、ファイル名を participants、クエリパラメータを {SEARCH_PARTICIPANTS} にしてください。"
    );
    let _ = writeln!(
        out,
        "GBBの部門には Solo、Tag Team、Loopstation、Producer、Crew などがあります。"
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "# 回答例1");
    let _ = writeln!(
        out,
        r#"{{"url": "{origin}/{year}/top", "parameter": "{CONTACT_ANCHOR}", "name": "None"}}"#
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "# 回答例2");
    let _ = write!(
        out,
        r#"{{"url": "{origin}/{year}/participants", "parameter": "{SEARCH_PARTICIPANTS}", "name": "ROFU"}}"#
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_year_and_question() {
        let prompt = render_prompt(2024, "審査員は誰？");

        assert!(prompt.contains("「審査員は誰？」"));
        assert!(prompt.contains("GBB2024"));
        assert!(prompt.contains("https://gbbinfo-jpn.onrender.com/2024/"));
        assert!(!prompt.contains("{year}"));
    }

    #[test]
    fn test_prompt_lists_every_page_and_scroll() {
        let prompt = render_prompt(2025, "x");

        for page in PAGES {
            assert!(prompt.contains(&format!("- {}: ", page.file)), "{}", page.file);
            for scroll in page.scroll {
                assert!(prompt.contains(&format!("    - {}\n", scroll)), "{}", scroll);
            }
        }
    }

    #[test]
    fn test_answer_examples_are_valid_json() {
        let prompt = render_prompt(2025, "x");
        let examples: Vec<serde_json::Value> = prompt
            .lines()
            .filter(|line| line.starts_with('{'))
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(examples.len(), 2);
        assert_eq!(examples[1]["parameter"], SEARCH_PARTICIPANTS);
        assert_eq!(examples[1]["url"], "https://gbbinfo-jpn.onrender.com/2025/participants");
    }

    #[test]
    fn test_custom_origin() {
        let prompt = render_prompt_for("http://localhost:8080/", 2024, "x");
        assert!(prompt.contains("http://localhost:8080/2024/top"));
        assert!(!prompt.contains(DEFAULT_SITE_ORIGIN));
    }
}
