//! Drag resolution: map a drop onto a single scope move

use shared::models::{CourseOutline, DragEvent, DragPayload, ScopeRef};
use shared::ErrorKind;
use thiserror::Error;

/// A drag the controller cannot apply
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("Lessons can only be reordered within the same module.")]
    CrossModule { from: String, to: String },

    #[error("Module {0} is not part of this course.")]
    UnknownModule(String),

    #[error("Item {0} is not in the current course structure.")]
    UnknownItem(String),
}

impl ResolutionError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ClientResolutionFailure
    }
}

/// Move of one child inside one scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    pub scope: ScopeRef,
    pub from: usize,
    pub to: usize,
}

/// 解析拖拽事件
///
/// | 拖动 | 放置目标 | 结果 |
/// |------|----------|------|
/// | 任意 | 无 / 自身 | 无操作 |
/// | 模块 | 模块 | 模块排序 |
/// | 模块 | 课时 | 移到该课时所属模块的位置 |
/// | 课时 | 模块标题 | 无操作 |
/// | 课时 | 同模块课时 | 课时排序 |
/// | 课时 | 其他模块课时 | `CrossModule` |
///
/// `Ok(None)` means nothing changes and nothing is sent.
pub fn resolve_drag(
    outline: &CourseOutline,
    event: &DragEvent,
) -> Result<Option<MovePlan>, ResolutionError> {
    let Some(over) = &event.over else {
        return Ok(None);
    };
    let active = &event.active;
    if active.id == over.id {
        return Ok(None);
    }

    match &active.payload {
        DragPayload::Module => {
            let target = match &over.payload {
                DragPayload::Module => over.id.as_str(),
                DragPayload::Lesson { module_id } => module_id.as_str(),
            };
            if target == active.id {
                return Ok(None);
            }
            let from = module_index(outline, &active.id)?;
            let to = module_index(outline, target)?;
            Ok(plan(ScopeRef::course(outline.course.id.clone()), from, to))
        }
        DragPayload::Lesson { module_id } => {
            let over_module = match &over.payload {
                DragPayload::Module => return Ok(None),
                DragPayload::Lesson { module_id } => module_id,
            };
            if module_id != over_module {
                return Err(ResolutionError::CrossModule {
                    from: module_id.clone(),
                    to: over_module.clone(),
                });
            }

            let module = outline
                .module(module_id)
                .ok_or_else(|| ResolutionError::UnknownModule(module_id.clone()))?;
            let index_of = |id: &str| {
                module
                    .lessons
                    .iter()
                    .position(|l| l.id == id)
                    .ok_or_else(|| ResolutionError::UnknownItem(id.to_string()))
            };
            let from = index_of(&active.id)?;
            let to = index_of(&over.id)?;
            Ok(plan(
                ScopeRef::module(outline.course.id.clone(), module_id.clone()),
                from,
                to,
            ))
        }
    }
}

fn module_index(outline: &CourseOutline, id: &str) -> Result<usize, ResolutionError> {
    outline
        .modules
        .iter()
        .position(|m| m.id() == id)
        .ok_or_else(|| ResolutionError::UnknownItem(id.to_string()))
}

fn plan(scope: ScopeRef, from: usize, to: usize) -> Option<MovePlan> {
    (from != to).then_some(MovePlan { scope, from, to })
}

/// Remove the item at `from` and reinsert it at `to`
///
/// Everything between the two slots shifts by one; this is never a swap.
pub fn move_item<T>(list: &mut Vec<T>, from: usize, to: usize) {
    if from == to || from >= list.len() || to >= list.len() {
        return;
    }
    let item = list.remove(from);
    list.insert(to, item);
}
