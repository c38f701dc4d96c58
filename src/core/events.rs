use bevy::prelude::*;

use crate::data::schema::{BoneAttachment, ItemId, SiblingToggle};

/// 给命令行看的反馈
#[derive(Event)]
pub struct LogEvent(pub String);

/// 交给表现层处理的副作用：音效、挂件、显隐切换、面板开关
#[derive(Event, Debug, Clone, PartialEq)]
pub enum PresentationCue {
    PlaySound(String),
    AttachProps { item: ItemId, attachments: Vec<BoneAttachment> },
    DetachProps { item: ItemId },
    ToggleSiblings { toggles: Vec<SiblingToggle>, equipped: bool },
    SetObjectsActive { names: Vec<String>, active: bool },
    ChestPanel { chest: String, visible: bool },
}

/// 逻辑层收集的 cue 统一在这里发出去
pub fn emit_cues(writer: &mut EventWriter<PresentationCue>, cues: Vec<PresentationCue>) {
    for cue in cues {
        writer.write(cue);
    }
}

/// 没有真正的表现层，先打日志
pub fn trace_cues(mut reader: EventReader<PresentationCue>) {
    for cue in reader.read() {
        debug!("cue: {cue:?}");
    }
}
