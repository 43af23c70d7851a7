use super::*;
use capturekit_testing::fixtures;

fn log(message: &str) -> CapturedLogRecord {
    CapturedLogRecord {
        timestamp: "2024-05-01T10:00:00.000Z".to_string(),
        level: "error".to_string(),
        message: message.to_string(),
    }
}

fn request(status: Option<i64>, body: Option<&str>) -> CapturedNetworkRecord {
    CapturedNetworkRecord {
        request_id: "r1".to_string(),
        url: "https://shop.example/api/cart".to_string(),
        method: "POST".to_string(),
        headers: Default::default(),
        post_data: None,
        timestamp: 0.5,
        status,
        response_headers: None,
        response_body: body.map(str::to_string),
    }
}

#[test]
fn test_title_first_line_capped() {
    assert_eq!(task_title("  Fix the cart button\nIt is broken  "), "Fix the cart button");
    assert_eq!(task_title(&"x".repeat(200)).chars().count(), 80);
    assert_eq!(task_title(""), "");
}

#[test]
fn test_task_only() {
    let ctx = PromptContext {
        task: "  Fix it  ",
        element: None,
        include_css: true,
        logs: &[],
        network: &[],
    };
    assert_eq!(build_prompt(&ctx), "Fix it");
}

#[test]
fn test_sections_in_order() {
    let element = fixtures::element_with_details(1);
    let logs = [log("Uncaught TypeError")];
    let network = [request(Some(500), Some("{\"error\":true}"))];
    let ctx = PromptContext {
        task: "Fix the buy button",
        element: Some(&element),
        include_css: true,
        logs: &logs,
        network: &network,
    };
    let prompt = build_prompt(&ctx);

    let positions: Vec<usize> = [
        "Fix the buy button",
        "```html\n<button class=\"buy\">Buy</button>\n```",
        "DOM Path:\n```css\nhtml > body > div.cart > button.buy\n```",
        "--- Element Dimensions ---\nWidth: 120px, Height: 32.5px",
        "Padding: 4px 4px 4px 4px",
        "/* default */\nelement {\n  color: rgb(0, 0, 0);\n  display: inline-block;\n}",
        "[2024-05-01T10:00:00.000Z] [error] Uncaught TypeError",
        "POST https://shop.example/api/cart - Status: 500\nResponse Body (truncated):\n{\"error\":true}",
        "--- End Network Activity ---",
    ]
    .iter()
    .map(|needle| prompt.find(needle).unwrap_or_else(|| panic!("missing {:?}", needle)))
    .collect();

    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", prompt);
}

#[test]
fn test_css_left_out_when_disabled() {
    let element = fixtures::element_with_details(1);
    let ctx = PromptContext {
        task: "t",
        element: Some(&element),
        include_css: false,
        logs: &[],
        network: &[],
    };
    let prompt = build_prompt(&ctx);
    assert!(prompt.contains("```html"));
    assert!(!prompt.contains("Element Dimensions"));
    assert!(!prompt.contains("computed CSS"));
}

#[test]
fn test_pending_request_rendered() {
    let network = [request(None, None)];
    let ctx = PromptContext {
        task: "t",
        element: None,
        include_css: false,
        logs: &[],
        network: &network,
    };
    let prompt = build_prompt(&ctx);
    assert!(prompt.contains("[1970-01-01T00:00:00.500Z] POST"));
    assert!(prompt.contains("Status: N/A\nResponse Body (truncated):\nN/A"));
}
