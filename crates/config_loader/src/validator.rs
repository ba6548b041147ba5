//! 配置校验模块
//!
//! 校验规则：
//! - 字段级规则 (范围/长度) 由 blueprint 上的 derive 驱动
//! - 输入流 topic 互不相同
//! - depth_min_m < depth_max_m
//! - sink 名称唯一

use std::collections::HashSet;

use contracts::{PerceptionError, PipelineBlueprint};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 PipelineBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &PipelineBlueprint) -> Result<(), PerceptionError> {
    validate_field_rules(blueprint)?;
    validate_stream_topics(blueprint)?;
    validate_depth_range(blueprint)?;
    validate_sink_names(blueprint)?;
    Ok(())
}

/// 运行 derive 声明的字段级规则
fn validate_field_rules(blueprint: &PipelineBlueprint) -> Result<(), PerceptionError> {
    blueprint
        .validate()
        .map_err(|errors| match first_error(String::new(), &errors) {
            Some((field, message)) => PerceptionError::config_validation(field, message),
            None => PerceptionError::config_validation("blueprint", errors.to_string()),
        })
}

/// 深度优先取第一个字段错误, 路径用点号拼接
fn first_error(prefix: String, errors: &ValidationErrors) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(error) = list.first() {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed `{}` rule", error.code));
                    return Some((path, message));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_error(path, inner) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    if let Some(found) = first_error(format!("{path}[{index}]"), inner) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

/// 校验输入流 topic 互不相同
fn validate_stream_topics(blueprint: &PipelineBlueprint) -> Result<(), PerceptionError> {
    let streams = &blueprint.streams;
    let mut seen = HashSet::new();
    for (field, topic) in [
        ("streams.color", &streams.color),
        ("streams.depth", &streams.depth),
        ("streams.camera_info", &streams.camera_info),
    ] {
        if !seen.insert(topic.as_str()) {
            return Err(PerceptionError::config_validation(
                field,
                format!("topic '{topic}' already used by another stream"),
            ));
        }
    }
    Ok(())
}

/// 校验深度范围
fn validate_depth_range(blueprint: &PipelineBlueprint) -> Result<(), PerceptionError> {
    let fusion = &blueprint.fusion;
    if fusion.depth_min_m < 0.0 {
        return Err(PerceptionError::config_validation(
            "fusion.depth_min_m",
            format!("depth floor must be >= 0, got {}", fusion.depth_min_m),
        ));
    }
    if fusion.depth_min_m >= fusion.depth_max_m {
        return Err(PerceptionError::config_validation(
            "fusion.depth_min_m / fusion.depth_max_m",
            format!(
                "depth_min_m ({}) must be < depth_max_m ({})",
                fusion.depth_min_m, fusion.depth_max_m
            ),
        ));
    }
    Ok(())
}

/// 校验 sink 名称唯一性
fn validate_sink_names(blueprint: &PipelineBlueprint) -> Result<(), PerceptionError> {
    let mut seen = HashSet::new();
    for sink in &blueprint.sinks {
        if !seen.insert(&sink.name) {
            return Err(PerceptionError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}
