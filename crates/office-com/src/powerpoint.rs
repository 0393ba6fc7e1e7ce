//! PowerPoint commands on the bridge. Presentations and slides are 1-based.

use office_com_protocol::{Command, ResponseData, WireLayout, WirePresentation};
use office_core::shape::catalog::{AutoShapeKind, ConnectorKind};
use office_core::shape::{Frame, ShapeEdit, StyleProperties};
use office_core::{Rgb, ShapeInfo};

use crate::bridge::{BridgeError, BridgeResult, ComBridge};
use crate::convert;

/// Shapes of one slide and its layout name
#[derive(Debug, Clone, PartialEq)]
pub struct SlideShapes {
    pub layout: Option<String>,
    pub shapes: Vec<ShapeInfo>,
}

impl ComBridge {
    pub fn list_presentations(&self) -> BridgeResult<Vec<WirePresentation>> {
        match self.call_for(Command::ListPresentations)? {
            ResponseData::Presentations { presentations } => Ok(presentations),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    pub fn open_presentation(&self, path: &str) -> BridgeResult<WirePresentation> {
        let data = self.call_for(Command::OpenPresentation {
            path: path.to_string(),
        })?;
        match data {
            ResponseData::Presentation { presentation } => Ok(presentation),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    pub fn save_presentation(&self, presentation: u32, path: Option<&str>) -> BridgeResult<()> {
        self.call(Command::SavePresentation {
            presentation,
            path: path.map(str::to_string),
        })?;
        Ok(())
    }

    pub fn list_layouts(&self, presentation: u32) -> BridgeResult<Vec<WireLayout>> {
        match self.call_for(Command::ListLayouts { presentation })? {
            ResponseData::Layouts { layouts } => Ok(layouts),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Append a slide on the 1-based `layout`; returns the new slide's index
    pub fn add_slide(&self, presentation: u32, layout: u32) -> BridgeResult<u32> {
        match self.call_for(Command::AddSlide {
            presentation,
            layout,
        })? {
            ResponseData::Slide { slide_index } => Ok(slide_index),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    pub fn delete_slide(&self, presentation: u32, slide: u32) -> BridgeResult<()> {
        self.call(Command::DeleteSlide {
            presentation,
            slide,
        })?;
        Ok(())
    }

    pub fn slide_shapes(&self, presentation: u32, slide: u32) -> BridgeResult<SlideShapes> {
        match self.call_for(Command::ListShapes {
            presentation,
            slide,
        })? {
            ResponseData::Shapes { shapes, layout } => Ok(SlideShapes {
                layout,
                shapes: shapes.iter().map(convert::shape_info).collect(),
            }),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    fn expect_shape(data: ResponseData) -> BridgeResult<ShapeInfo> {
        match data {
            ResponseData::Shape { shape } => Ok(convert::shape_info(&shape)),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    pub fn add_text_box(
        &self,
        presentation: u32,
        slide: u32,
        frame: Frame,
        text: &str,
        font_size: Option<f64>,
    ) -> BridgeResult<ShapeInfo> {
        Self::expect_shape(self.call_for(Command::AddTextBox {
            presentation,
            slide,
            frame: convert::wire_frame(frame),
            text: text.to_string(),
            font_size,
        })?)
    }

    pub fn add_shape(
        &self,
        presentation: u32,
        slide: u32,
        kind: &AutoShapeKind,
        frame: Frame,
    ) -> BridgeResult<ShapeInfo> {
        Self::expect_shape(self.call_for(Command::AddShape {
            presentation,
            slide,
            auto_shape: kind.mso_id,
            frame: convert::wire_frame(frame),
        })?)
    }

    pub fn add_connector(
        &self,
        presentation: u32,
        slide: u32,
        kind: &ConnectorKind,
        from_shape: u32,
        to_shape: u32,
    ) -> BridgeResult<ShapeInfo> {
        Self::expect_shape(self.call_for(Command::AddConnector {
            presentation,
            slide,
            connector: kind.mso_id,
            from_shape,
            to_shape,
        })?)
    }

    /// Apply an edit and return the shape as it is afterwards
    pub fn edit_shape(
        &self,
        presentation: u32,
        slide: u32,
        shape: u32,
        edit: &ShapeEdit,
    ) -> BridgeResult<ShapeInfo> {
        Self::expect_shape(self.call_for(Command::EditShape {
            presentation,
            slide,
            shape,
            edit: convert::wire_edit(edit),
        })?)
    }

    pub fn style_shape(
        &self,
        presentation: u32,
        slide: u32,
        shape: u32,
        style: &StyleProperties,
    ) -> BridgeResult<()> {
        self.call(Command::StyleShape {
            presentation,
            slide,
            shape,
            style: convert::wire_style(style),
        })?;
        Ok(())
    }

    pub fn set_background(&self, presentation: u32, slide: u32, color: Rgb) -> BridgeResult<()> {
        self.call(Command::SetBackground {
            presentation,
            slide,
            color: color.to_ole(),
        })?;
        Ok(())
    }
}
