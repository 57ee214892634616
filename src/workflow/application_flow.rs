//! 职位投递流程 - 流程层
//!
//! 核心职责：定义"一个职位"的完整投递流程
//!
//! 流程顺序：
//! 1. 点开职位卡片 → 等待并点击 Easy Apply
//! 2. 填写联系方式
//! 3. 循环：上传附件 → 提交 / 错误恢复 / 下一步 / 检查 / 失败
//! 4. 无论结果如何都关闭弹窗
//!
//! 单次投递内的所有故障都在这里收敛为 `ApplicationReport`。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::{debug, error, info, warn};

use crate::config::{Config, TimingSettings};
use crate::error::ApplyFault;
use crate::infrastructure::{ElementHandle, FillOutcome, PageDriver};
use crate::models::{ApplicationRecord, JobCandidate};
use crate::services::similarity::normalize_question;
use crate::services::{
    Answer, AnswerResolver, Control, ElementResolver, Resolution, ResolveContext,
};
use crate::utils::truncate_text;
use crate::workflow::application_ctx::ApplicationCtx;
use crate::workflow::modal::dismiss_open_modal;
use crate::workflow::wizard::{
    decide, RecoveryVerdict, StepAction, StepObservation, WizardPhase, WizardState, MAX_RECHECKS,
};

/// 页面出现该文字即视为投递成功
const SUCCESS_TEXT: &str = "application was sent";

/// 联系方式分组的标题
const PHONE_SECTION_TEXT: &str = "Mobile phone number";

/// 单次投递的结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationOutcome {
    /// 没有找到投递按钮
    NoApplyControl,
    Submitted,
    Discarded,
    Failed(ApplyFault),
}

impl ApplicationOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, ApplicationOutcome::Submitted)
    }

    /// 会话故障需要由上层判断是否终止整个运行
    pub fn is_session_fault(&self) -> bool {
        matches!(
            self,
            ApplicationOutcome::Failed(ApplyFault::SessionFault { .. })
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApplicationOutcome::NoApplyControl => "无投递按钮",
            ApplicationOutcome::Submitted => "已提交",
            ApplicationOutcome::Discarded => "已放弃",
            ApplicationOutcome::Failed(_) => "失败",
        }
    }
}

/// 单次投递的报告
#[derive(Debug, Clone)]
pub struct ApplicationReport {
    pub record: ApplicationRecord,
    pub outcome: ApplicationOutcome,
    pub steps: usize,
    pub rechecks: usize,
    /// 非致命问题（附件、未回答的必填题等）
    pub notes: Vec<ApplyFault>,
    /// 结束时是否关闭了弹窗
    pub modal_dismissed: bool,
}

/// 错误恢复中一轮答题的结果
enum SectionPass {
    Done,
    Discarded,
}

/// 投递流程
///
/// - 编排单个职位的完整投递流程
/// - 不持有 page，只通过 `PageDriver` 操作
/// - 只依赖业务能力（services）
pub struct ApplicationFlow {
    resolver: ElementResolver,
    uploads: HashMap<String, String>,
    phone_number: String,
    uncheck_follow_company: bool,
    max_wizard_steps: usize,
    timing: TimingSettings,
}

impl ApplicationFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            resolver: ElementResolver::with_defaults(),
            uploads: config.uploads.clone(),
            phone_number: config.phone_number.clone(),
            uncheck_follow_company: config.uncheck_follow_company,
            max_wizard_steps: config.max_wizard_steps,
            timing: config.timing.clone(),
        }
    }

    /// 替换控件定位器
    pub fn with_resolver(mut self, resolver: ElementResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_timing(mut self, timing: TimingSettings) -> Self {
        self.timing = timing;
        self
    }

    /// 投递一个职位
    ///
    /// 不返回错误：页面异常被映射为 `Failed(SessionFault)`，
    /// 结束时总会尝试关闭弹窗。
    pub async fn run(
        &self,
        page: &dyn PageDriver,
        answers: &mut AnswerResolver,
        candidate: &JobCandidate,
        ctx: &ApplicationCtx,
    ) -> ApplicationReport {
        let mut state = WizardState::new();

        let outcome = match self.attempt(page, answers, candidate, ctx, &mut state).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("{} ❌ 投递过程中页面异常: {:#}", ctx, e);
                state.transition(WizardPhase::Failed);
                ApplicationOutcome::Failed(ApplyFault::SessionFault {
                    reason: e.to_string(),
                })
            }
        };

        let modal_dismissed = dismiss_open_modal(page, &self.resolver, &self.timing).await;

        let record = ApplicationRecord::new(
            candidate,
            state.apply_located,
            outcome.is_submitted(),
        );

        let detail = match &outcome {
            ApplicationOutcome::Failed(fault) => format!(" ({})", fault),
            _ => String::new(),
        };
        info!(
            "{} {} | {} @ {} | 步骤 {} | 复查 {}{}",
            ctx,
            outcome.label(),
            candidate.title,
            candidate.company,
            state.step_count,
            state.retry_count,
            detail
        );

        ApplicationReport {
            record,
            outcome,
            steps: state.step_count,
            rechecks: state.retry_count,
            notes: state.notes,
            modal_dismissed,
        }
    }

    async fn attempt(
        &self,
        page: &dyn PageDriver,
        answers: &mut AnswerResolver,
        candidate: &JobCandidate,
        ctx: &ApplicationCtx,
        state: &mut WizardState,
    ) -> Result<ApplicationOutcome> {
        let rctx = ctx.resolve_ctx();

        if let Some(card) = &candidate.card {
            debug!("{} 打开职位卡片", ctx);
            page.click(card).await?;
            tokio::time::sleep(self.timing.card_open()).await;
        }

        let button = match self
            .resolver
            .wait_for(Control::EasyApply, page, &rctx, &self.timing)
            .await
        {
            Resolution::Found(button) => button,
            Resolution::NotFound => {
                info!("{} ⏭️ 未找到 Easy Apply 按钮，跳过", ctx);
                state.note(ApplyFault::ElementNotFound {
                    control: Control::EasyApply.to_string(),
                });
                return Ok(ApplicationOutcome::NoApplyControl);
            }
            Resolution::Error(reason) => return Err(anyhow!(reason)),
        };

        state.apply_located = true;
        info!("{} 🖱️ 点击 Easy Apply", ctx);
        self.click(page, &button.handle).await?;
        state.transition(WizardPhase::Opened);

        self.fill_contact(page, ctx).await?;

        self.drive(page, answers, ctx, &rctx, state).await
    }

    /// 向导主循环
    async fn drive(
        &self,
        page: &dyn PageDriver,
        answers: &mut AnswerResolver,
        ctx: &ApplicationCtx,
        rctx: &ResolveContext,
        state: &mut WizardState,
    ) -> Result<ApplicationOutcome> {
        loop {
            if state.step_count >= self.max_wizard_steps {
                warn!("{} ⚠️ 向导超过 {} 步仍未结束", ctx, self.max_wizard_steps);
                state.transition(WizardPhase::Failed);
                return Ok(ApplicationOutcome::Failed(ApplyFault::StepLimit {
                    steps: state.step_count,
                }));
            }
            state.step_count += 1;
            state.transition(WizardPhase::FillingStep);

            self.upload_documents(page, ctx, rctx, state).await;
            self.toggle_follow_company(page, ctx, rctx, state).await?;

            let observation = self.observe(page, rctx).await?;
            let action = decide(&observation);
            state.transition(action.phase());

            match action {
                StepAction::Submit(handle) => {
                    info!("{} 📤 提交申请", ctx);
                    self.click(page, &handle).await?;
                    state.transition(WizardPhase::Submitted);
                    return Ok(ApplicationOutcome::Submitted);
                }
                StepAction::Recover => {
                    match self.recover(page, answers, ctx, rctx, state).await? {
                        RecoveryVerdict::Submitted => {
                            state.transition(WizardPhase::Submitted);
                            return Ok(ApplicationOutcome::Submitted);
                        }
                        RecoveryVerdict::Cleared => continue,
                        RecoveryVerdict::Discarded => return Ok(ApplicationOutcome::Discarded),
                        RecoveryVerdict::Retry | RecoveryVerdict::Exhausted => {
                            warn!("{} ⚠️ 复查 {} 次后仍有校验错误", ctx, state.retry_count);
                            state.transition(WizardPhase::Failed);
                            return Ok(ApplicationOutcome::Failed(
                                ApplyFault::FormValidationError,
                            ));
                        }
                    }
                }
                StepAction::Advance(control, handle) => {
                    debug!("{} ➡️ 点击 {}", ctx, control);
                    self.click(page, &handle).await?;
                }
                StepAction::Stuck => {
                    warn!("{} ⚠️ 没有可识别的向导控件", ctx);
                    return Ok(ApplicationOutcome::Failed(ApplyFault::ElementNotFound {
                        control: "next/review/submit".to_string(),
                    }));
                }
            }
        }
    }

    async fn observe(&self, page: &dyn PageDriver, rctx: &ResolveContext) -> Result<StepObservation> {
        Ok(StepObservation {
            submit: self.locate(page, Control::Submit, rctx).await?,
            error_feedback: self.locate(page, Control::ErrorFeedback, rctx).await?.is_some(),
            next: self.locate(page, Control::Next, rctx).await?,
            review: self.locate(page, Control::Review, rctx).await?,
        })
    }

    async fn locate(
        &self,
        page: &dyn PageDriver,
        control: Control,
        rctx: &ResolveContext,
    ) -> Result<Option<ElementHandle>> {
        Ok(self
            .resolver
            .resolve(control, page, rctx)
            .await
            .into_result()?
            .map(|element| element.handle))
    }

    /// 错误恢复：答题、暂停、复查，复查次数按投递累计
    ///
    /// 用户放弃时立即返回，不再复查成功提示。
    async fn recover(
        &self,
        page: &dyn PageDriver,
        answers: &mut AnswerResolver,
        ctx: &ApplicationCtx,
        rctx: &ResolveContext,
        state: &mut WizardState,
    ) -> Result<RecoveryVerdict> {
        if self.success_visible(page).await? {
            info!("{} ✓ 页面显示申请已发送", ctx);
            return Ok(RecoveryVerdict::Submitted);
        }

        loop {
            if !state.can_recheck() {
                return Ok(RecoveryVerdict::Exhausted);
            }

            info!(
                "{} 📝 回答表单问题 (复查 {}/{})",
                ctx,
                state.retry_count + 1,
                MAX_RECHECKS
            );
            if let SectionPass::Discarded = self.answer_sections(page, answers, ctx, state).await? {
                info!("{} 🗑️ 按用户要求放弃本次投递", ctx);
                state.note(ApplyFault::UserDiscard);
                state.transition(WizardPhase::Discarded);
                return Ok(RecoveryVerdict::Discarded);
            }

            tokio::time::sleep(self.timing.recheck_pause()).await;

            let success = self.success_visible(page).await?;
            let error_visible = self.locate(page, Control::ErrorFeedback, rctx).await?.is_some();
            match state.recheck(success, error_visible) {
                RecoveryVerdict::Retry => continue,
                verdict => return Ok(verdict),
            }
        }
    }

    /// 回答所有尚未填写的表单分组
    async fn answer_sections(
        &self,
        page: &dyn PageDriver,
        answers: &mut AnswerResolver,
        ctx: &ApplicationCtx,
        state: &mut WizardState,
    ) -> Result<SectionPass> {
        for section in page.form_sections().await? {
            if section.is_answered() {
                continue;
            }
            let question = normalize_question(&section.text);
            if question.is_empty() {
                continue;
            }

            match answers.answer(&question).await {
                Answer::Discard => return Ok(SectionPass::Discarded),
                Answer::Unanswerable => {
                    if section.is_required() {
                        warn!(
                            "{} ⚠️ 必填问题无法回答，留待人工处理: '{}'",
                            ctx,
                            truncate_text(&question, 80)
                        );
                        state.note(ApplyFault::Unanswerable { question });
                    } else {
                        info!(
                            "{} 可选问题无法回答，跳过: '{}'",
                            ctx,
                            truncate_text(&question, 80)
                        );
                    }
                }
                Answer::Text { value, .. } if value.is_empty() => {
                    debug!("{} 留空: '{}'", ctx, question);
                }
                Answer::Text { value, .. } => match page.fill_section(&section, &value).await? {
                    FillOutcome::Filled => debug!("{} ✓ 已填写 '{}'", ctx, question),
                    FillOutcome::NoMatchingOption => {
                        warn!("{} 选项中没有 '{}': '{}'", ctx, value, question)
                    }
                    FillOutcome::NoInput => debug!("{} 分组没有可填写的控件: '{}'", ctx, question),
                },
            }
        }
        Ok(SectionPass::Done)
    }

    async fn success_visible(&self, page: &dyn PageDriver) -> Result<bool> {
        let text = page.page_text().await?;
        Ok(text.to_lowercase().contains(SUCCESS_TEXT))
    }

    /// 填写手机号
    async fn fill_contact(&self, page: &dyn PageDriver, ctx: &ApplicationCtx) -> Result<()> {
        if self.phone_number.trim().is_empty() {
            return Ok(());
        }
        for section in page.form_sections().await? {
            if section.text.contains(PHONE_SECTION_TEXT) {
                page.fill_section(&section, &self.phone_number).await?;
                debug!("{} 已填写手机号", ctx);
            }
        }
        Ok(())
    }

    /// 上传简历与求职信；任何问题都只记录，不中断流程
    async fn upload_documents(
        &self,
        page: &dyn PageDriver,
        ctx: &ApplicationCtx,
        rctx: &ResolveContext,
        state: &mut WizardState,
    ) {
        let slots = [
            (Control::ResumeSection, Control::ResumeInput, "Resume"),
            (Control::CoverLetterSection, Control::CoverLetterInput, "Cover Letter"),
        ];

        for (section, input, key) in slots {
            match self.resolver.resolve(section, page, rctx).await {
                Resolution::Found(_) => {}
                Resolution::NotFound => continue,
                Resolution::Error(reason) => {
                    debug!("{} 检查 {} 上传区失败: {}", ctx, key, reason);
                    continue;
                }
            }

            info!("{} 📎 检测到 {} 上传区", ctx, key);
            let path = match self.upload_path(key) {
                Ok(path) => path,
                Err(fault) => {
                    warn!("{} {}", ctx, fault);
                    state.note(fault);
                    continue;
                }
            };

            let fault = match self.resolver.resolve(input, page, rctx).await {
                Resolution::Found(element) => match page.upload_file(&element.handle, &path).await {
                    Ok(()) => {
                        info!("{} ✓ {} 上传成功", ctx, key);
                        tokio::time::sleep(self.timing.settle()).await;
                        continue;
                    }
                    Err(e) => ApplyFault::UploadFailure {
                        reason: format!("{}: {}", key, e),
                    },
                },
                Resolution::NotFound => ApplyFault::ElementNotFound {
                    control: input.to_string(),
                },
                Resolution::Error(reason) => ApplyFault::UploadFailure { reason },
            };
            warn!("{} {}，继续而不附带 {}", ctx, fault, key);
            state.note(fault);
        }
    }

    fn upload_path(&self, key: &str) -> Result<PathBuf, ApplyFault> {
        let configured = self
            .uploads
            .get(key)
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApplyFault::UploadFailure {
                reason: format!("未配置 {} 路径", key),
            })?;
        let path = Path::new(configured);
        if !path.exists() {
            return Err(ApplyFault::UploadFailure {
                reason: format!("{} 文件不存在: {}", key, path.display()),
            });
        }
        Ok(path.to_path_buf())
    }

    /// 取消勾选"关注公司"，每次投递最多一次
    async fn toggle_follow_company(
        &self,
        page: &dyn PageDriver,
        ctx: &ApplicationCtx,
        rctx: &ResolveContext,
        state: &mut WizardState,
    ) -> Result<()> {
        if !self.uncheck_follow_company || state.follow_toggled {
            return Ok(());
        }
        if let Some(handle) = self.locate(page, Control::FollowCompany, rctx).await? {
            self.click(page, &handle).await?;
            state.follow_toggled = true;
            debug!("{} 已取消关注公司", ctx);
        }
        Ok(())
    }

    async fn click(&self, page: &dyn PageDriver, handle: &ElementHandle) -> Result<()> {
        page.click(handle).await?;
        tokio::time::sleep(self.timing.settle()).await;
        Ok(())
    }
}
