//! Static description of the decoder for hosts

use crate::nodes::decoders::types::{AnnotationClass, AnnotationRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub desc: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassInfo {
    pub class: AnnotationClass,
    pub id: &'static str,
    pub desc: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowInfo {
    pub row: AnnotationRow,
    pub id: &'static str,
    pub desc: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub longname: &'static str,
    pub desc: &'static str,
    pub license: &'static str,
    pub channels: &'static [ChannelInfo],
    pub annotations: &'static [ClassInfo],
    pub rows: &'static [RowInfo],
}

impl DecoderInfo {
    pub fn class(&self, class: AnnotationClass) -> Option<&ClassInfo> {
        self.annotations.iter().find(|c| c.class == class)
    }

    pub fn row(&self, id: &str) -> Option<&RowInfo> {
        self.rows.iter().find(|r| r.id == id)
    }
}

pub const ZDI_DECODER: DecoderInfo = DecoderInfo {
    id: "zdi",
    name: "ZDI",
    longname: "Zilog Debug Interface",
    desc: "Two-wire debug interface of eZ80 processors.",
    license: "gplv2+",
    channels: &[
        ChannelInfo {
            id: "zda",
            name: "ZDA",
            desc: "Data line",
        },
        ChannelInfo {
            id: "zcl",
            name: "ZCL",
            desc: "Clock line",
        },
    ],
    annotations: &[
        ClassInfo {
            class: AnnotationClass::Start,
            id: "start",
            desc: "START",
        },
        ClassInfo {
            class: AnnotationClass::Bit,
            id: "bit",
            desc: "Bit",
        },
        ClassInfo {
            class: AnnotationClass::Separator,
            id: "separator",
            desc: "Separator bit",
        },
        ClassInfo {
            class: AnnotationClass::Direction,
            id: "rw",
            desc: "RW bit",
        },
        ClassInfo {
            class: AnnotationClass::Register,
            id: "register",
            desc: "Register",
        },
        ClassInfo {
            class: AnnotationClass::Value,
            id: "value",
            desc: "Value",
        },
        ClassInfo {
            class: AnnotationClass::Action,
            id: "action",
            desc: "Action",
        },
    ],
    rows: &[
        RowInfo {
            row: AnnotationRow::Bits,
            id: "bits",
            desc: "Bits",
        },
        RowInfo {
            row: AnnotationRow::Command,
            id: "command",
            desc: "Command",
        },
        RowInfo {
            row: AnnotationRow::Action,
            id: "action",
            desc: "Action",
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes_listed_in_id_order() {
        let ids: Vec<u8> = ZDI_DECODER.annotations.iter().map(|c| c.class.id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(ZDI_DECODER.class(AnnotationClass::Direction).map(|c| c.id), Some("rw"));
    }

    #[test]
    fn test_rows_and_channels() {
        assert_eq!(ZDI_DECODER.channels.len(), 2);
        assert_eq!(ZDI_DECODER.channels[1].id, "zcl");
        assert_eq!(ZDI_DECODER.row("command").map(|r| r.row), Some(AnnotationRow::Command));
        assert!(ZDI_DECODER.row("nope").is_none());
    }
}
