//! Office COM Bridge: a Windows process that drives the user's running Excel
//! or PowerPoint through COM, controlled by JSON commands over stdin/stdout.
//!
//! Cross-compiled from Linux and run under WINE, or run natively on Windows.
//!
//! Protocol: newline-delimited JSON. `Request`s arrive on stdin, `Response`s
//! leave on stdout, and diagnostics go to stderr only.

#[cfg(windows)]
mod dispatch;
#[cfg(windows)]
mod excel;
#[cfg(windows)]
mod powerpoint;
#[cfg_attr(not(windows), allow(dead_code))]
mod values;

#[cfg(not(windows))]
fn main() {
    eprintln!("office-com-bridge must be compiled for Windows (--target x86_64-pc-windows-gnu)");
    eprintln!("and run under WINE on Linux.");
    std::process::exit(1);
}

#[cfg(windows)]
enum Session {
    Excel(excel::ExcelSession),
    PowerPoint(powerpoint::PowerPointSession),
}

#[cfg(windows)]
impl Session {
    fn attach(app: office_com_protocol::App) -> Result<Self, String> {
        use office_com_protocol::App;
        match app {
            App::Excel => excel::ExcelSession::attach().map(Session::Excel),
            App::PowerPoint => powerpoint::PowerPointSession::attach().map(Session::PowerPoint),
        }
    }

    fn app(&self) -> office_com_protocol::App {
        match self {
            Session::Excel(_) => office_com_protocol::App::Excel,
            Session::PowerPoint(_) => office_com_protocol::App::PowerPoint,
        }
    }

    fn version(&self) -> Result<String, String> {
        match self {
            Session::Excel(s) => s.version(),
            Session::PowerPoint(s) => s.version(),
        }
    }
}

#[cfg(windows)]
fn main() {
    use std::io::{self, BufRead, Write};

    use office_com_protocol::{Command, Request, Response, ResponseResult};

    eprintln!("[office-com-bridge] Starting up...");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut session: Option<Session> = None;

    let mut reply = |response: &Response| {
        match serde_json::to_string(response) {
            Ok(json) => {
                let _ = writeln!(out, "{json}");
            }
            Err(e) => eprintln!("[office-com-bridge] Could not encode response: {e}"),
        }
        let _ = out.flush();
    };

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("[office-com-bridge] stdin read error: {e}");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: Request = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("[office-com-bridge] Unparseable request: {line}");
                reply(&Response {
                    id: 0,
                    result: ResponseResult::error(format!("JSON parse error: {e}")),
                });
                continue;
            }
        };

        let response = Response {
            id: request.id,
            result: handle_command(&mut session, &request.command),
        };
        reply(&response);

        if matches!(request.command, Command::Shutdown) {
            break;
        }
    }

    if session.take().is_some() {
        uninit_com();
    }
    eprintln!("[office-com-bridge] Process exiting.");
}

#[cfg(windows)]
fn handle_command(
    session: &mut Option<Session>,
    command: &office_com_protocol::Command,
) -> office_com_protocol::ResponseResult {
    use office_com_protocol::{Command, ResponseData as Data, ResponseResult};

    let result = match command {
        Command::Init { app } => init(session, *app),
        Command::Ping => ping(session),
        Command::Shutdown => {
            // release COM; the application stays open for the user
            if session.take().is_some() {
                uninit_com();
            }
            Ok(None)
        }

        Command::ListWorkbooks => {
            with_excel(session, |x| Ok(Some(Data::Workbooks { workbooks: x.list_workbooks()? })))
        }
        Command::OpenWorkbook { path } => with_excel(session, |x| {
            Ok(Some(Data::Workbook {
                workbook: x.open_workbook(path)?,
            }))
        }),
        Command::SaveWorkbook { workbook, path } => with_excel(session, |x| {
            x.save_workbook(*workbook, path.as_deref()).map(|_| None)
        }),
        Command::ListWorksheets { workbook } => with_excel(session, |x| {
            Ok(Some(Data::Worksheets {
                worksheets: x.list_worksheets(*workbook)?,
            }))
        }),
        Command::AddWorksheet { workbook, name } => with_excel(session, |x| {
            Ok(Some(Data::Worksheet {
                worksheet: x.add_worksheet(*workbook, name.as_deref())?,
            }))
        }),
        Command::GetCellValue {
            workbook,
            sheet,
            cell,
        } => with_excel(session, |x| {
            Ok(Some(Data::Value {
                value: x.get_cell_value(*workbook, sheet, cell)?,
            }))
        }),
        Command::SetCellValue {
            workbook,
            sheet,
            cell,
            value,
        } => with_excel(session, |x| {
            x.set_cell_value(*workbook, sheet, cell, value).map(|_| None)
        }),
        Command::GetRangeValues {
            workbook,
            sheet,
            range,
        } => with_excel(session, |x| {
            Ok(Some(Data::Values {
                values: x.get_range_values(*workbook, sheet, range)?,
            }))
        }),
        Command::GetRangeFormulas {
            workbook,
            sheet,
            range,
        } => with_excel(session, |x| {
            Ok(Some(Data::Formulas {
                formulas: x.get_range_formulas(*workbook, sheet, range)?,
            }))
        }),
        Command::SetRangeValues {
            workbook,
            sheet,
            start_cell,
            values,
        } => with_excel(session, |x| {
            x.set_range_values(*workbook, sheet, start_cell, values)
                .map(|_| None)
        }),
        Command::GetUsedRange { workbook, sheet } => with_excel(session, |x| {
            Ok(Some(Data::UsedRange {
                used_range: x.get_used_range(*workbook, sheet)?,
            }))
        }),

        Command::ListPresentations => with_powerpoint(session, |p| {
            Ok(Some(Data::Presentations {
                presentations: p.list_presentations()?,
            }))
        }),
        Command::OpenPresentation { path } => with_powerpoint(session, |p| {
            Ok(Some(Data::Presentation {
                presentation: p.open_presentation(path)?,
            }))
        }),
        Command::SavePresentation { presentation, path } => with_powerpoint(session, |p| {
            p.save_presentation(*presentation, path.as_deref())
                .map(|_| None)
        }),
        Command::ListLayouts { presentation } => with_powerpoint(session, |p| {
            Ok(Some(Data::Layouts {
                layouts: p.list_layouts(*presentation)?,
            }))
        }),
        Command::AddSlide {
            presentation,
            layout,
        } => with_powerpoint(session, |p| {
            Ok(Some(Data::Slide {
                slide_index: p.add_slide(*presentation, *layout)?,
            }))
        }),
        Command::DeleteSlide {
            presentation,
            slide,
        } => with_powerpoint(session, |p| p.delete_slide(*presentation, *slide).map(|_| None)),
        Command::ListShapes {
            presentation,
            slide,
        } => with_powerpoint(session, |p| {
            let (shapes, layout) = p.list_shapes(*presentation, *slide)?;
            Ok(Some(Data::Shapes { shapes, layout }))
        }),
        Command::AddTextBox {
            presentation,
            slide,
            frame,
            text,
            font_size,
        } => with_powerpoint(session, |p| {
            Ok(Some(Data::Shape {
                shape: p.add_text_box(*presentation, *slide, frame, text, *font_size)?,
            }))
        }),
        Command::AddShape {
            presentation,
            slide,
            auto_shape,
            frame,
        } => with_powerpoint(session, |p| {
            Ok(Some(Data::Shape {
                shape: p.add_shape(*presentation, *slide, *auto_shape, frame)?,
            }))
        }),
        Command::AddConnector {
            presentation,
            slide,
            connector,
            from_shape,
            to_shape,
        } => with_powerpoint(session, |p| {
            Ok(Some(Data::Shape {
                shape: p.add_connector(*presentation, *slide, *connector, *from_shape, *to_shape)?,
            }))
        }),
        Command::EditShape {
            presentation,
            slide,
            shape,
            edit,
        } => with_powerpoint(session, |p| {
            Ok(Some(Data::Shape {
                shape: p.edit_shape(*presentation, *slide, *shape, edit)?,
            }))
        }),
        Command::StyleShape {
            presentation,
            slide,
            shape,
            style,
        } => with_powerpoint(session, |p| {
            p.style_shape(*presentation, *slide, *shape, style)
                .map(|_| None)
        }),
        Command::SetBackground {
            presentation,
            slide,
            color,
        } => with_powerpoint(session, |p| {
            p.set_background(*presentation, *slide, *color).map(|_| None)
        }),
    };

    match result {
        Ok(Some(data)) => ResponseResult::ok(data),
        Ok(None) => ResponseResult::done(),
        Err(message) => ResponseResult::error(message),
    }
}

#[cfg(windows)]
type Handled = Result<Option<office_com_protocol::ResponseData>, String>;

#[cfg(windows)]
fn init(session: &mut Option<Session>, app: office_com_protocol::App) -> Handled {
    use office_com_protocol::ResponseData;
    use windows::Win32::System::Com::{CoInitializeEx, COINIT_APARTMENTTHREADED};

    if let Some(existing) = session.as_ref() {
        if existing.app() != app {
            return Err(format!("Bridge is already attached to {}", existing.app()));
        }
    } else {
        // Office requires a single-threaded apartment
        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
            .ok()
            .map_err(|e| format!("CoInitializeEx failed: {e}"))?;
        eprintln!("[office-com-bridge] COM initialized (STA)");
        *session = Some(Session::attach(app)?);
    }
    let version = session
        .as_ref()
        .ok_or_else(|| format!("Could not connect to {app}"))?
        .version()?;
    Ok(Some(ResponseData::Version { version }))
}

/// Ping the application, re-attaching once if it stopped answering
#[cfg(windows)]
fn ping(session: &mut Option<Session>) -> Handled {
    use office_com_protocol::ResponseData;

    let current = session
        .as_ref()
        .ok_or("Not initialized. Send 'Init' first.")?;
    let version = match current.version() {
        Ok(v) => v,
        Err(e) => {
            let app = current.app();
            eprintln!("[office-com-bridge] {app} unresponsive ({e}), re-attaching");
            let fresh = Session::attach(app).map_err(|_| format!("Could not reconnect to {app}."))?;
            let version = fresh.version()?;
            *session = Some(fresh);
            version
        }
    };
    Ok(Some(ResponseData::Version { version }))
}

#[cfg(windows)]
fn uninit_com() {
    unsafe {
        windows::Win32::System::Com::CoUninitialize();
    }
    eprintln!("[office-com-bridge] COM uninitialized");
}

#[cfg(windows)]
fn with_excel(
    session: &mut Option<Session>,
    f: impl FnOnce(&excel::ExcelSession) -> Handled,
) -> Handled {
    match session {
        Some(Session::Excel(x)) => f(x),
        Some(Session::PowerPoint(_)) => Err("This bridge is attached to PowerPoint, not Excel".into()),
        None => Err("Excel not initialized. Send 'Init' first.".into()),
    }
}

#[cfg(windows)]
fn with_powerpoint(
    session: &mut Option<Session>,
    f: impl FnOnce(&powerpoint::PowerPointSession) -> Handled,
) -> Handled {
    match session {
        Some(Session::PowerPoint(p)) => f(p),
        Some(Session::Excel(_)) => Err("This bridge is attached to Excel, not PowerPoint".into()),
        None => Err("PowerPoint not initialized. Send 'Init' first.".into()),
    }
}
