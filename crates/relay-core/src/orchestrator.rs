//! Sequential settings run over a batch of devices.
//!
//! Each device is processed in isolation: a failure marks that device as
//! failed and out of service, and the run moves on. All writes are committed
//! once, after the last device.

use anyhow::Context;
use chrono::{DateTime, Utc};
use relay_config::{PatternLists, RelayConfig};
use relay_model::{
    AttrValue, CurveMapEntry, DeviceOutcome, MappingRuleSource, ObjectId, ProtectionDeviceContext,
    UpdateStatus,
};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::classify::{TypeCheck, apply_phase, check_relay_type, determine_phase, update_device_function};
use crate::device::RELAY_CLASS;
use crate::dip::update_logic_elements;
use crate::engine::{ApplyContext, apply_settings, build_setting_dictionary};
use crate::error::Result;
use crate::fuse::update_fuse;
use crate::model::TargetDeviceModel;
use crate::reclosing::update_reclosing_logic;
use crate::transformer::{update_ct, update_vt};
use crate::types::TypeIndex;

/// Result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub outcomes: Vec<DeviceOutcome>,
    /// Whether any relay attribute changed value.
    pub updated: bool,
}

impl RunReport {
    pub fn count(&self, status: UpdateStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn outcome(&self, device: &str) -> Option<&DeviceOutcome> {
        self.outcomes.iter().find(|o| o.device == device)
    }
}

/// Drives relay and fuse updates against a target model.
pub struct Orchestrator<'a> {
    rules: &'a dyn MappingRuleSource,
    patterns: &'a PatternLists,
    curve_mapping: Vec<CurveMapEntry>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(rules: &'a dyn MappingRuleSource, patterns: &'a PatternLists) -> Result<Self> {
        Ok(Self {
            rules,
            patterns,
            curve_mapping: rules.load_curve_mapping()?,
        })
    }

    pub fn from_config(config: &'a RelayConfig) -> Result<Self> {
        Self::new(config, &config.patterns)
    }

    /// Process every device and commit once.
    pub fn run(
        &self,
        model: &mut dyn TargetDeviceModel,
        devices: Vec<ProtectionDeviceContext>,
    ) -> Result<RunReport> {
        let started = Utc::now();
        let types = TypeIndex::build(model)?;
        info!(
            devices = devices.len(),
            relay_types = types.relay_count(),
            fuse_types = types.fuse_count(),
            "starting settings run"
        );

        let mut outcomes = Vec::with_capacity(devices.len());
        let mut updated = false;
        for mut device in devices {
            let Some(target) = device.target else {
                debug!(device = %device.name, "no target object, skipped");
                continue;
            };
            let span = info_span!("device", name = %device.name);
            let _entered = span.enter();

            if device.setting_id.is_none() && !device.is_fuse() {
                outcomes.push(DeviceOutcome::not_in_repository(&device));
                continue;
            }

            let outcome = match self.process(model, &mut device, target, &types) {
                Ok((outcome, changed)) => {
                    updated |= changed;
                    outcome
                }
                Err(e) => {
                    let detail = format!("{e:#}");
                    warn!(error = %detail, "device processing failed");
                    if let Err(e) = model.set_attribute(target, "outserv", AttrValue::Int(1)) {
                        warn!(error = %e, "could not take failed device out of service");
                    }
                    DeviceOutcome::script_failed(&device, &detail)
                }
            };
            debug!(status = outcome.status.label(), "device processed");
            outcomes.push(outcome);

            if let Err(e) = self.apply_service_state(model, &device, target) {
                warn!(error = %e, "could not apply service state");
            }
        }

        model.commit()?;
        let report = RunReport {
            started,
            finished: Utc::now(),
            outcomes,
            updated,
        };
        info!(
            processed = report.outcomes.len(),
            failed = report.count(UpdateStatus::ScriptFailed),
            "settings run complete"
        );
        Ok(report)
    }

    fn process(
        &self,
        model: &mut dyn TargetDeviceModel,
        device: &mut ProtectionDeviceContext,
        target: ObjectId,
        types: &TypeIndex,
    ) -> anyhow::Result<(DeviceOutcome, bool)> {
        if model.class_name(target)? == RELAY_CLASS {
            self.update_relay(model, device, target, types)
        } else {
            let outcome = update_fuse(model, device, target, types).context("typing fuse")?;
            Ok((outcome, false))
        }
    }

    fn update_relay(
        &self,
        model: &mut dyn TargetDeviceModel,
        device: &mut ProtectionDeviceContext,
        target: ObjectId,
        types: &TypeIndex,
    ) -> anyhow::Result<(DeviceOutcome, bool)> {
        update_device_function(model, device, target).context("classifying device")?;
        let mut outcome = DeviceOutcome::from_device(device);

        let Some(table) = self.rules.load_rules(&device.pattern)? else {
            info!(pattern = %device.pattern, "no mapping rules for pattern");
            model.set_attribute(target, "outserv", AttrValue::Int(1))?;
            return Ok((outcome.with_status(UpdateStatus::NotMapped), false));
        };

        let check = check_relay_type(model, target, &table.target_type, types)
            .context("checking relay type")?;
        if check == TypeCheck::NotFound {
            outcome.status = UpdateStatus::TypeNotFound;
        }

        if let Some(phase) = determine_phase(device, self.patterns) {
            apply_phase(model, target, phase)?;
        }

        let rules = table.prepare_for_device(&model.name(target)?);
        let dictionary = build_setting_dictionary(&device.settings, &rules);
        outcome.date_setting = device.date.clone();
        let date = device.date.clone().unwrap_or_default();
        model.set_attribute(target, "sernum", AttrValue::text(date))?;

        let ctx = ApplyContext {
            device: &*device,
            target,
            rules: &rules,
            dictionary: &dictionary,
            curve_mapping: &self.curve_mapping,
        };
        let changed = apply_settings(model, &ctx).context("applying settings")?;
        update_reclosing_logic(model, device, target, &rules, &dictionary, self.patterns)
            .context("building reclosing logic")?;
        update_logic_elements(model, target, &rules, &dictionary).context("building dip switches")?;

        outcome.ct = Some(update_ct(model, device, target).context("linking current transformer")?);
        outcome.vt = Some(update_vt(model, device, target).context("linking voltage transformer")?);
        Ok((outcome, changed))
    }

    fn apply_service_state(
        &self,
        model: &mut dyn TargetDeviceModel,
        device: &ProtectionDeviceContext,
        target: ObjectId,
    ) -> Result<()> {
        if self.patterns.is_out_of_service(&device.pattern) {
            debug!(pattern = %device.pattern, "pattern listed out of service");
            model.set_attribute(target, "outserv", AttrValue::Int(1))?;
        }
        if device.switch_closed == Some(false) {
            debug!("associated switch is open");
            model.set_attribute(target, "outserv", AttrValue::Int(1))?;
        }
        Ok(())
    }
}
