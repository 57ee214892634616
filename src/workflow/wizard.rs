//! 投递向导状态机
//!
//! 纯状态与转移规则，不操作页面。页面观察结果由流程层填入
//! `StepObservation`，这里只决定下一步做什么。

use std::fmt;

use tracing::debug;

use crate::error::ApplyFault;
use crate::infrastructure::ElementHandle;
use crate::services::Control;

/// 每次投递中错误恢复的最多复查次数
pub const MAX_RECHECKS: usize = 3;

/// 向导阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    /// 尚未打开投递窗口
    Closed,
    Opened,
    FillingStep,
    Next,
    Review,
    Submitting,
    ErrorRecovery,
    Submitted,
    Discarded,
    Failed,
}

impl WizardPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WizardPhase::Submitted | WizardPhase::Discarded | WizardPhase::Failed
        )
    }
}

impl fmt::Display for WizardPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 一步中观察到的控件
#[derive(Debug, Clone, Default)]
pub struct StepObservation {
    pub submit: Option<ElementHandle>,
    pub error_feedback: bool,
    pub next: Option<ElementHandle>,
    pub review: Option<ElementHandle>,
}

/// 对一步的决定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    Submit(ElementHandle),
    Recover,
    Advance(Control, ElementHandle),
    /// 没有可识别的控件，向导无法推进
    Stuck,
}

impl StepAction {
    pub fn phase(&self) -> WizardPhase {
        match self {
            StepAction::Submit(_) => WizardPhase::Submitting,
            StepAction::Recover => WizardPhase::ErrorRecovery,
            StepAction::Advance(Control::Review, _) => WizardPhase::Review,
            StepAction::Advance(..) => WizardPhase::Next,
            StepAction::Stuck => WizardPhase::Failed,
        }
    }
}

/// 按优先级决定：提交 > 错误恢复 > 下一步 > 检查 > 失败
pub fn decide(observation: &StepObservation) -> StepAction {
    if let Some(submit) = &observation.submit {
        return StepAction::Submit(submit.clone());
    }
    if observation.error_feedback {
        return StepAction::Recover;
    }
    if let Some(next) = &observation.next {
        return StepAction::Advance(Control::Next, next.clone());
    }
    if let Some(review) = &observation.review {
        return StepAction::Advance(Control::Review, review.clone());
    }
    StepAction::Stuck
}

/// 错误恢复一轮复查后的结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryVerdict {
    Submitted,
    /// 错误提示消失，回到填写步骤
    Cleared,
    /// 仍有错误，还可以继续复查
    Retry,
    /// 复查次数用尽
    Exhausted,
    /// 用户放弃
    Discarded,
}

/// 单次投递的临时状态，投递结束即丢弃
#[derive(Debug, Clone)]
pub struct WizardState {
    pub phase: WizardPhase,
    pub step_count: usize,
    pub retry_count: usize,
    pub discarded: bool,
    /// 是否找到并点击过投递按钮
    pub apply_located: bool,
    pub follow_toggled: bool,
    /// 过程中出现的非致命问题
    pub notes: Vec<ApplyFault>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            phase: WizardPhase::Closed,
            step_count: 0,
            retry_count: 0,
            discarded: false,
            apply_located: false,
            follow_toggled: false,
            notes: Vec::new(),
        }
    }

    pub fn transition(&mut self, next: WizardPhase) {
        debug!("向导状态: {} → {}", self.phase, next);
        self.phase = next;
        if next == WizardPhase::Discarded {
            self.discarded = true;
        }
    }

    pub fn can_recheck(&self) -> bool {
        self.retry_count < MAX_RECHECKS
    }

    /// 记录一次复查并给出结论
    pub fn recheck(&mut self, success_visible: bool, error_visible: bool) -> RecoveryVerdict {
        self.retry_count += 1;
        if success_visible {
            RecoveryVerdict::Submitted
        } else if !error_visible {
            RecoveryVerdict::Cleared
        } else if self.can_recheck() {
            RecoveryVerdict::Retry
        } else {
            RecoveryVerdict::Exhausted
        }
    }

    pub fn note(&mut self, fault: ApplyFault) {
        self.notes.push(fault);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: &str) -> Option<ElementHandle> {
        Some(ElementHandle::new(id))
    }

    #[test]
    fn test_submit_has_priority() {
        let observation = StepObservation {
            submit: handle("submit"),
            error_feedback: true,
            next: handle("next"),
            review: handle("review"),
        };
        assert_eq!(
            decide(&observation),
            StepAction::Submit(ElementHandle::new("submit"))
        );
    }

    #[test]
    fn test_error_before_next() {
        let observation = StepObservation {
            error_feedback: true,
            next: handle("next"),
            ..Default::default()
        };
        assert_eq!(decide(&observation), StepAction::Recover);
    }

    #[test]
    fn test_next_before_review() {
        let observation = StepObservation {
            next: handle("next"),
            review: handle("review"),
            ..Default::default()
        };
        let action = decide(&observation);
        assert_eq!(action.phase(), WizardPhase::Next);

        let only_review = StepObservation {
            review: handle("review"),
            ..Default::default()
        };
        assert_eq!(decide(&only_review).phase(), WizardPhase::Review);
    }

    #[test]
    fn test_nothing_visible_fails() {
        assert_eq!(decide(&StepObservation::default()), StepAction::Stuck);
        assert!(StepAction::Stuck.phase().is_terminal());
    }

    #[test]
    fn test_recheck_bound() {
        let mut state = WizardState::new();
        assert_eq!(state.recheck(false, true), RecoveryVerdict::Retry);
        assert_eq!(state.recheck(false, true), RecoveryVerdict::Retry);
        assert_eq!(state.recheck(false, true), RecoveryVerdict::Exhausted);
        assert_eq!(state.retry_count, MAX_RECHECKS);
        assert!(!state.can_recheck());
    }

    #[test]
    fn test_recheck_success_and_cleared() {
        let mut state = WizardState::new();
        assert_eq!(state.recheck(true, true), RecoveryVerdict::Submitted);
        assert_eq!(state.recheck(false, false), RecoveryVerdict::Cleared);
    }

    #[test]
    fn test_discard_sets_flag() {
        let mut state = WizardState::new();
        state.transition(WizardPhase::Discarded);
        assert!(state.discarded);
        assert!(state.phase.is_terminal());
    }
}
