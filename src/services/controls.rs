//! 控件注册表
//!
//! 每个逻辑控件及其按优先级排列的定位策略。
//! 站点改版时只需改这里。

use std::collections::HashMap;
use std::fmt;

use super::element_resolver::{Interactability, LocatorStrategy, Matcher, SelectorStrategy};

/// 投递流程中用到的逻辑控件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    EasyApply,
    Next,
    Review,
    Submit,
    /// 表单校验错误提示
    ErrorFeedback,
    ResumeSection,
    CoverLetterSection,
    ResumeInput,
    CoverLetterInput,
    FollowCompany,
    DiscardConfirm,
    Dismiss,
}

impl Control {
    pub const ALL: [Control; 12] = [
        Control::EasyApply,
        Control::Next,
        Control::Review,
        Control::Submit,
        Control::ErrorFeedback,
        Control::ResumeSection,
        Control::CoverLetterSection,
        Control::ResumeInput,
        Control::CoverLetterInput,
        Control::FollowCompany,
        Control::DiscardConfirm,
        Control::Dismiss,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Control::EasyApply => "easy-apply",
            Control::Next => "next",
            Control::Review => "review",
            Control::Submit => "submit",
            Control::ErrorFeedback => "error-feedback",
            Control::ResumeSection => "resume-section",
            Control::CoverLetterSection => "cover-letter-section",
            Control::ResumeInput => "resume-input",
            Control::CoverLetterInput => "cover-letter-input",
            Control::FollowCompany => "follow-company",
            Control::DiscardConfirm => "discard-confirm",
            Control::Dismiss => "dismiss",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

type Chain = Vec<Box<dyn LocatorStrategy>>;

fn strategy(label: &str, css: &'static str, matchers: Vec<Matcher>) -> SelectorStrategy {
    SelectorStrategy::new(label, css, matchers)
}

fn boxed(strategies: Vec<SelectorStrategy>) -> Chain {
    strategies
        .into_iter()
        .map(|s| Box::new(s) as Box<dyn LocatorStrategy>)
        .collect()
}

fn easy_apply_chain() -> Chain {
    use Matcher::*;
    boxed(vec![
        strategy("id=jobs-apply-button", "button", vec![IdEquals("jobs-apply-button")]),
        strategy("id=jobs-apply-button-id", "button", vec![IdEquals("jobs-apply-button-id")]),
        strategy(
            "class=jobs-apply-button",
            "button",
            vec![Tag("button"), HasClass("jobs-apply-button")],
        )
        .scoped_to_job(),
        strategy("aria~=Easy Apply", "button", vec![Tag("button"), AriaContains("Easy Apply")])
            .scoped_to_job(),
        strategy("text~=easy apply", "button", vec![Tag("button"), TextContains("easy apply")])
            .scoped_to_job(),
        strategy(
            "class=artdeco-button--primary",
            "button",
            vec![
                Tag("button"),
                HasClass("artdeco-button--primary"),
                TextOrAriaContains("easy apply"),
            ],
        )
        .scoped_to_job(),
    ])
}

fn wizard_button_chain(aria: &'static str, text: &'static str) -> Chain {
    use Matcher::*;
    boxed(vec![
        strategy(&format!("aria={}", aria), "button", vec![Tag("button"), AriaEquals(aria)]),
        strategy(&format!("aria~={}", aria), "button", vec![Tag("button"), AriaContains(aria)]),
        strategy(&format!("text={}", text), "button", vec![Tag("button"), TextEquals(text)]),
    ])
}

fn error_feedback_chain() -> Chain {
    use Matcher::*;
    boxed(vec![
        strategy(
            "class=artdeco-inline-feedback__message",
            ".artdeco-inline-feedback__message",
            vec![HasClass("artdeco-inline-feedback__message")],
        )
        .requiring(Interactability::Visible),
        strategy(
            "class~=inline-feedback--error",
            ".artdeco-inline-feedback--error",
            vec![ClassContains("inline-feedback--error")],
        )
        .requiring(Interactability::Visible),
    ])
}

fn upload_section_chain(heading: &'static str) -> Chain {
    use Matcher::*;
    boxed(vec![strategy(
        &format!("span={}", heading),
        "span",
        vec![Tag("span"), TextEquals(heading)],
    )
    .requiring(Interactability::Visible)])
}

fn resume_input_chain() -> Chain {
    use Matcher::*;
    boxed(vec![
        strategy(
            "id~=upload-resume",
            "input[type='file']",
            vec![IdContains("jobs-document-upload-file-input-upload-resume")],
        )
        .requiring(Interactability::Attached),
        strategy(
            "file input id~=resume",
            "input[type='file']",
            vec![Tag("input"), InputType("file"), IdContains("resume")],
        )
        .requiring(Interactability::Attached),
        strategy(
            "file input name~=resume",
            "input[type='file']",
            vec![Tag("input"), InputType("file"), NameContains("resume")],
        )
        .requiring(Interactability::Attached),
    ])
}

fn cover_letter_input_chain() -> Chain {
    use Matcher::*;
    boxed(vec![
        strategy(
            "id~=upload-cover-letter",
            "input[type='file']",
            vec![IdContains("jobs-document-upload-file-input-upload-cover-letter")],
        )
        .requiring(Interactability::Attached),
        strategy(
            "file input id~=cover",
            "input[type='file']",
            vec![Tag("input"), InputType("file"), IdContains("cover")],
        )
        .requiring(Interactability::Attached),
    ])
}

fn follow_company_chain() -> Chain {
    use Matcher::*;
    boxed(vec![strategy(
        "label[for=follow-company-checkbox]",
        "label",
        vec![Tag("label"), AttrEquals("for", "follow-company-checkbox")],
    )])
}

fn discard_confirm_chain() -> Chain {
    use Matcher::*;
    boxed(vec![
        strategy(
            "data-test-dialog-primary-btn",
            "button",
            vec![Tag("button"), AttrPresent("data-test-dialog-primary-btn")],
        ),
        strategy("text=Discard", "button", vec![Tag("button"), TextEquals("Discard")]),
        strategy("aria~=Discard", "button", vec![Tag("button"), AriaContains("Discard")]),
    ])
}

fn dismiss_chain() -> Chain {
    use Matcher::*;
    boxed(vec![
        strategy("aria=Dismiss", "button", vec![Tag("button"), AriaEquals("Dismiss")]),
        strategy(
            "data-test-modal-close-btn",
            "button",
            vec![Tag("button"), AttrPresent("data-test-modal-close-btn")],
        ),
        strategy(
            "class=artdeco-modal__dismiss",
            "button",
            vec![HasClass("artdeco-modal__dismiss")],
        ),
    ])
}

/// 内置策略表
pub fn default_registry() -> HashMap<Control, Vec<Box<dyn LocatorStrategy>>> {
    let mut chains: HashMap<Control, Chain> = HashMap::new();
    chains.insert(Control::EasyApply, easy_apply_chain());
    chains.insert(
        Control::Next,
        wizard_button_chain("Continue to next step", "Next"),
    );
    chains.insert(
        Control::Review,
        wizard_button_chain("Review your application", "Review"),
    );
    chains.insert(
        Control::Submit,
        wizard_button_chain("Submit application", "Submit application"),
    );
    chains.insert(Control::ErrorFeedback, error_feedback_chain());
    chains.insert(Control::ResumeSection, upload_section_chain("Upload resume"));
    chains.insert(
        Control::CoverLetterSection,
        upload_section_chain("Upload cover letter"),
    );
    chains.insert(Control::ResumeInput, resume_input_chain());
    chains.insert(Control::CoverLetterInput, cover_letter_input_chain());
    chains.insert(Control::FollowCompany, follow_company_chain());
    chains.insert(Control::DiscardConfirm, discard_confirm_chain());
    chains.insert(Control::Dismiss, dismiss_chain());
    chains
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_control_has_a_chain() {
        let registry = default_registry();
        for control in Control::ALL {
            let chain = registry.get(&control);
            assert!(
                chain.map(|c| !c.is_empty()).unwrap_or(false),
                "{} 没有定位策略",
                control
            );
        }
    }

    #[test]
    fn test_easy_apply_chain_order() {
        let chain = easy_apply_chain();
        assert_eq!(chain[0].describe(), "id=jobs-apply-button");
        assert_eq!(chain.len(), 6);
    }
}
