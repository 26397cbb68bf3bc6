//! Prompts for the teaching-assistant answer model.

use serde_json::{Value, json};

/// Reply the model must give when the passages do not contain the answer.
pub const NOT_FOUND_SENTINEL: &str = "Không có trong tài liệu.";

const GROUNDED_SYSTEM: &str = "Bạn là Trợ giảng AI. Chỉ sử dụng thông tin trong 'Tài liệu tham khảo' \
để trả lời. Nếu không đủ thông tin, hãy trả lời đúng câu: 'Không có trong tài liệu.'";

const OPEN_SYSTEM: &str = "Bạn là Trợ giảng AI. Trả lời ngắn gọn, chính xác bằng tiếng Việt.";

/// Build chat messages for `question`.
///
/// With context the model is confined to the passages; without it the
/// question is answered directly.
pub fn build_messages(question: &str, context: &[String]) -> Vec<Value> {
    if context.is_empty() {
        return vec![
            json!({ "role": "system", "content": OPEN_SYSTEM }),
            json!({ "role": "user", "content": format!("Câu hỏi: {question}") }),
        ];
    }

    let reference = context
        .iter()
        .enumerate()
        .map(|(i, passage)| format!("[{}] {passage}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    let user = format!(
        "Tài liệu tham khảo (trích đoạn):\n{reference}\n\n\
         Câu hỏi: {question}\n\
         Hãy trả lời ngắn gọn, chính xác, bám sát tài liệu."
    );
    vec![
        json!({ "role": "system", "content": GROUNDED_SYSTEM }),
        json!({ "role": "user", "content": user }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grounded_prompt_contains_passages_and_sentinel() {
        let context = vec!["Ti thể tạo ATP.".to_string(), "Lục lạp quang hợp.".to_string()];
        let messages = build_messages("Ti thể làm gì?", &context);
        assert_eq!(messages.len(), 2);

        let system = messages[0]["content"].as_str().unwrap();
        assert!(system.contains(NOT_FOUND_SENTINEL));

        let user = messages[1]["content"].as_str().unwrap();
        assert!(user.contains("[1] Ti thể tạo ATP."));
        assert!(user.contains("[2] Lục lạp quang hợp."));
        assert!(user.contains("Câu hỏi: Ti thể làm gì?"));
    }

    #[test]
    fn test_open_prompt_without_context() {
        let messages = build_messages("2 + 2 = ?", &[]);
        assert!(!messages[0]["content"].as_str().unwrap().contains("Tài liệu"));
        assert_eq!(messages[1]["role"], "user");
    }
}
