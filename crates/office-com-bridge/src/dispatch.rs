//! Late-bound COM automation over `IDispatch`.
//!
//! Office's object model is reached the way VBScript reaches it: names are
//! looked up with `GetIDsOfNames` and invoked with `Invoke`. [`ComObject`]
//! wraps that, and the `variant_*` helpers build and read the `VARIANT`s that
//! cross the call.

#![cfg(windows)]

use std::ffi::c_void;
use std::mem::ManuallyDrop;
use std::ptr;

use windows::{
    core::{Interface, BSTR, GUID, HSTRING, IUnknown, PCWSTR},
    Win32::{
        Foundation::{DISP_E_EXCEPTION, DISP_E_PARAMNOTFOUND, VARIANT_BOOL},
        Globalization::GetSystemDefaultLCID,
        System::{
            Com::{
                CLSIDFromProgID, CoCreateInstance, IDispatch, CLSCTX_LOCAL_SERVER, DISPATCH_FLAGS,
                DISPATCH_METHOD, DISPATCH_PROPERTYGET, DISPATCH_PROPERTYPUT, DISPPARAMS,
                EXCEPINFO, SAFEARRAY, SAFEARRAYBOUND,
            },
            Ole::{
                GetActiveObject, SafeArrayCreate, SafeArrayDestroy, SafeArrayGetDim,
                SafeArrayGetElement, SafeArrayGetLBound, SafeArrayGetUBound, SafeArrayPutElement,
                DISPID_PROPERTYPUT,
            },
            Variant::{
                VariantClear, VARENUM, VARIANT, VT_ARRAY, VT_BOOL, VT_BSTR, VT_DATE, VT_DISPATCH,
                VT_EMPTY, VT_ERROR, VT_I2, VT_I4, VT_NULL, VT_R4, VT_R8, VT_VARIANT,
            },
        },
    },
};

use office_com_protocol::{WireDate, WireError, WireValue};

use crate::values::{excel_error_text, iso_to_ole_date, ole_date_to_iso};

// VARIANT keeps its unions in ManuallyDrop, so fields are set with ptr::write.

fn variant_of(vt: VARENUM, fill: impl FnOnce(&mut VARIANT)) -> VARIANT {
    let mut v = VARIANT::default();
    unsafe {
        ptr::write(&mut (*v.Anonymous.Anonymous).vt, vt);
    }
    fill(&mut v);
    v
}

pub fn variant_empty() -> VARIANT {
    VARIANT::default()
}

pub fn variant_bool(val: bool) -> VARIANT {
    variant_of(VT_BOOL, |v| unsafe {
        ptr::write(
            &mut (*v.Anonymous.Anonymous).Anonymous.boolVal,
            VARIANT_BOOL(if val { -1 } else { 0 }),
        );
    })
}

pub fn variant_f64(val: f64) -> VARIANT {
    variant_of(VT_R8, |v| unsafe {
        ptr::write(&mut (*v.Anonymous.Anonymous).Anonymous.dblVal, val);
    })
}

pub fn variant_i32(val: i32) -> VARIANT {
    variant_of(VT_I4, |v| unsafe {
        ptr::write(&mut (*v.Anonymous.Anonymous).Anonymous.lVal, val);
    })
}

pub fn variant_str(val: &str) -> VARIANT {
    variant_of(VT_BSTR, |v| unsafe {
        ptr::write(
            &mut (*v.Anonymous.Anonymous).Anonymous.bstrVal,
            ManuallyDrop::new(BSTR::from(val)),
        );
    })
}

fn variant_date(days: f64) -> VARIANT {
    variant_of(VT_DATE, |v| unsafe {
        ptr::write(&mut (*v.Anonymous.Anonymous).Anonymous.date, days);
    })
}

/// An omitted optional argument
pub fn variant_missing() -> VARIANT {
    variant_of(VT_ERROR, |v| unsafe {
        ptr::write(
            &mut (*v.Anonymous.Anonymous).Anonymous.scode,
            DISP_E_PARAMNOTFOUND.0,
        );
    })
}

pub fn variant_object(obj: &ComObject) -> VARIANT {
    variant_of(VT_DISPATCH, |v| unsafe {
        ptr::write(
            &mut (*v.Anonymous.Anonymous).Anonymous.pdispVal,
            ManuallyDrop::new(Some(obj.inner.clone())),
        );
    })
}

fn vt(v: &VARIANT) -> VARENUM {
    unsafe { v.Anonymous.Anonymous.vt }
}

pub fn variant_get_bool(v: &VARIANT) -> Option<bool> {
    match vt(v) {
        VT_BOOL => Some(unsafe { v.Anonymous.Anonymous.Anonymous.boolVal.0 != 0 }),
        _ => variant_get_f64(v).map(|n| n != 0.0),
    }
}

pub fn variant_get_f64(v: &VARIANT) -> Option<f64> {
    let anon = unsafe { &v.Anonymous.Anonymous.Anonymous };
    unsafe {
        match vt(v) {
            VT_R8 => Some(anon.dblVal),
            VT_R4 => Some(anon.fltVal as f64),
            VT_I4 => Some(anon.lVal as f64),
            VT_I2 => Some(anon.iVal as f64),
            _ => None,
        }
    }
}

pub fn variant_get_string(v: &VARIANT) -> Option<String> {
    if vt(v) == VT_BSTR {
        Some(unsafe { v.Anonymous.Anonymous.Anonymous.bstrVal.to_string() })
    } else {
        None
    }
}

fn variant_get_dispatch(v: &VARIANT) -> Option<IDispatch> {
    if vt(v) == VT_DISPATCH {
        unsafe { (*v.Anonymous.Anonymous.Anonymous.pdispVal).clone() }
    } else {
        None
    }
}

fn variant_is_empty(v: &VARIANT) -> bool {
    matches!(vt(v), VT_EMPTY | VT_NULL)
}

/// A scalar `VARIANT` as a wire value; anything unrecognised reads as null
pub fn variant_to_wire(v: &VARIANT) -> WireValue {
    let anon = unsafe { &v.Anonymous.Anonymous.Anonymous };
    match vt(v) {
        VT_EMPTY | VT_NULL => WireValue::Null,
        VT_BOOL => WireValue::Bool(unsafe { anon.boolVal.0 != 0 }),
        VT_BSTR => WireValue::String(unsafe { anon.bstrVal.to_string() }),
        VT_DATE => WireValue::Date(WireDate {
            date: ole_date_to_iso(unsafe { anon.date }),
        }),
        VT_ERROR => WireValue::Error(WireError {
            code: excel_error_text(unsafe { anon.scode } as u32 & 0xFFFF),
        }),
        _ => variant_get_f64(v).map_or(WireValue::Null, WireValue::Number),
    }
}

pub fn wire_to_variant(value: &WireValue) -> VARIANT {
    match value {
        WireValue::Null => variant_empty(),
        WireValue::Bool(b) => variant_bool(*b),
        WireValue::Number(n) => variant_f64(*n),
        WireValue::String(s) => variant_str(s),
        WireValue::Date(WireDate { date }) => match iso_to_ole_date(date) {
            Some(days) => variant_date(days),
            None => variant_str(date),
        },
        WireValue::Error(WireError { code }) => variant_str(code),
    }
}

// -- SAFEARRAY --

fn is_array(v: &VARIANT) -> bool {
    vt(v).0 & VT_ARRAY.0 != 0
}

/// A `Range.Value`/`Range.Formula` result as rows; a single cell comes back
/// as a scalar and becomes a 1x1 block
pub fn variant_to_rows<T>(v: &VARIANT, cell: impl Fn(&VARIANT) -> T) -> Result<Vec<Vec<T>>, String> {
    if !is_array(v) {
        return Ok(vec![vec![cell(v)]]);
    }
    unsafe {
        let psa: *const SAFEARRAY = v.Anonymous.Anonymous.Anonymous.parray;
        if SafeArrayGetDim(psa) != 2 {
            return Err("Expected a two-dimensional array".to_string());
        }
        let bound = |lower: bool, dim: u32| {
            let r = if lower {
                SafeArrayGetLBound(psa, dim)
            } else {
                SafeArrayGetUBound(psa, dim)
            };
            r.map_err(|e| format!("SAFEARRAY bounds: {e}"))
        };
        let (row_lo, row_hi) = (bound(true, 1)?, bound(false, 1)?);
        let (col_lo, col_hi) = (bound(true, 2)?, bound(false, 2)?);

        let mut rows = Vec::with_capacity((row_hi - row_lo + 1).max(0) as usize);
        for r in row_lo..=row_hi {
            let mut row = Vec::with_capacity((col_hi - col_lo + 1).max(0) as usize);
            for c in col_lo..=col_hi {
                let indices = [r, c];
                let mut element = VARIANT::default();
                SafeArrayGetElement(psa, indices.as_ptr(), &mut element as *mut _ as *mut c_void)
                    .map_err(|e| format!("SAFEARRAY read at ({r}, {c}): {e}"))?;
                row.push(cell(&element));
                let _ = VariantClear(&mut element);
            }
            rows.push(row);
        }
        Ok(rows)
    }
}

/// A 1-based 2-D `VARIANT` array owned by the caller
pub struct VariantArray {
    psa: *mut SAFEARRAY,
}

impl VariantArray {
    /// Build from rows padded to the widest one
    pub fn from_rows(rows: &[Vec<WireValue>]) -> Result<Self, String> {
        let height = rows.len() as u32;
        let width = rows.iter().map(Vec::len).max().unwrap_or(0) as u32;
        let bounds = [
            SAFEARRAYBOUND {
                cElements: height,
                lLbound: 1,
            },
            SAFEARRAYBOUND {
                cElements: width,
                lLbound: 1,
            },
        ];
        let psa = unsafe { SafeArrayCreate(VT_VARIANT, 2, bounds.as_ptr()) };
        if psa.is_null() {
            return Err("SafeArrayCreate failed".to_string());
        }
        let array = Self { psa };
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let indices = [r as i32 + 1, c as i32 + 1];
                let mut element = wire_to_variant(value);
                let put = unsafe {
                    SafeArrayPutElement(array.psa, indices.as_ptr(), &element as *const _ as *const c_void)
                };
                unsafe {
                    let _ = VariantClear(&mut element);
                }
                put.map_err(|e| format!("SAFEARRAY write at ({r}, {c}): {e}"))?;
            }
        }
        Ok(array)
    }

    /// A `VARIANT` borrowing the array; valid while `self` lives
    pub fn as_variant(&self) -> VARIANT {
        variant_of(VARENUM(VT_ARRAY.0 | VT_VARIANT.0), |v| unsafe {
            ptr::write(&mut (*v.Anonymous.Anonymous).Anonymous.parray, self.psa);
        })
    }
}

impl Drop for VariantArray {
    fn drop(&mut self) {
        unsafe {
            let _ = SafeArrayDestroy(self.psa);
        }
    }
}

// -- ComObject --

/// An automation object
#[derive(Clone)]
pub struct ComObject {
    inner: IDispatch,
}

impl ComObject {
    /// Attach to the running instance registered for `prog_id`, or start one.
    /// Returns whether a new instance was started.
    pub fn attach_or_launch(prog_id: &str) -> Result<(Self, bool), String> {
        let clsid = unsafe { CLSIDFromProgID(&HSTRING::from(prog_id)) }
            .map_err(|e| format!("CLSIDFromProgID('{prog_id}') failed: {e}"))?;

        let mut unknown: Option<IUnknown> = None;
        let running = unsafe { GetActiveObject(&clsid, None, &mut unknown) };
        if let (Ok(()), Some(unknown)) = (running, unknown) {
            let inner: IDispatch = unknown
                .cast()
                .map_err(|e| format!("{prog_id} does not expose IDispatch: {e}"))?;
            return Ok((Self { inner }, false));
        }

        let inner: IDispatch = unsafe { CoCreateInstance(&clsid, None, CLSCTX_LOCAL_SERVER) }
            .map_err(|e| format!("CoCreateInstance('{prog_id}') failed: {e}"))?;
        Ok((Self { inner }, true))
    }

    fn dispid(&self, name: &str) -> Result<i32, String> {
        let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
        let names = [PCWSTR(wide.as_ptr())];
        let mut dispid = 0i32;
        unsafe {
            self.inner.GetIDsOfNames(
                &GUID::zeroed(),
                names.as_ptr(),
                1,
                GetSystemDefaultLCID(),
                &mut dispid,
            )
        }
        .map_err(|e| format!("Unknown member '{name}': {e}"))?;
        Ok(dispid)
    }

    /// `Invoke` with arguments in natural order
    fn invoke(&self, name: &str, flags: DISPATCH_FLAGS, args: &[VARIANT]) -> Result<VARIANT, String> {
        let dispid = self.dispid(name)?;
        let mut reversed: Vec<VARIANT> = args.iter().rev().cloned().collect();
        let params = DISPPARAMS {
            rgvarg: if reversed.is_empty() {
                ptr::null_mut()
            } else {
                reversed.as_mut_ptr()
            },
            rgdispidNamedArgs: ptr::null_mut(),
            cArgs: reversed.len() as u32,
            cNamedArgs: 0,
        };
        let mut result = VARIANT::default();
        let mut except = EXCEPINFO::default();
        unsafe {
            self.inner.Invoke(
                dispid,
                &GUID::zeroed(),
                GetSystemDefaultLCID(),
                flags,
                &params,
                Some(&mut result),
                Some(&mut except),
                None,
            )
        }
        .map_err(|e| invoke_error(e, &except, name))?;
        Ok(result)
    }

    /// `obj.Name`
    pub fn get(&self, name: &str) -> Result<VARIANT, String> {
        self.invoke(name, DISPATCH_PROPERTYGET, &[])
    }

    /// `obj.Name(args)` for parameterised properties such as `Range("A1")`
    pub fn get_with(&self, name: &str, args: &[VARIANT]) -> Result<VARIANT, String> {
        self.invoke(name, DISPATCH_PROPERTYGET, args)
    }

    /// `obj.Name = value`
    pub fn put(&self, name: &str, value: VARIANT) -> Result<(), String> {
        let dispid = self.dispid(name)?;
        let mut args = [value];
        let mut named = [DISPID_PROPERTYPUT];
        let params = DISPPARAMS {
            rgvarg: args.as_mut_ptr(),
            rgdispidNamedArgs: named.as_mut_ptr(),
            cArgs: 1,
            cNamedArgs: 1,
        };
        let mut except = EXCEPINFO::default();
        unsafe {
            self.inner.Invoke(
                dispid,
                &GUID::zeroed(),
                GetSystemDefaultLCID(),
                DISPATCH_PROPERTYPUT,
                &params,
                None,
                Some(&mut except),
                None,
            )
        }
        .map_err(|e| invoke_error(e, &except, name))
    }

    /// `obj.Name(args)` as a method call
    pub fn call(&self, name: &str, args: &[VARIANT]) -> Result<VARIANT, String> {
        self.invoke(name, DISPATCH_METHOD, args)
    }

    pub fn object(&self, name: &str) -> Result<ComObject, String> {
        to_object(&self.get(name)?, name)
    }

    pub fn object_with(&self, name: &str, args: &[VARIANT]) -> Result<ComObject, String> {
        to_object(&self.get_with(name, args)?, name)
    }

    pub fn call_object(&self, name: &str, args: &[VARIANT]) -> Result<ComObject, String> {
        to_object(&self.call(name, args)?, name)
    }

    /// `collection.Item(index)` with a 1-based position
    pub fn item(&self, index: i32) -> Result<ComObject, String> {
        self.object_with("Item", &[variant_i32(index)])
    }

    pub fn string(&self, name: &str) -> Result<String, String> {
        Ok(variant_get_string(&self.get(name)?).unwrap_or_default())
    }

    pub fn number(&self, name: &str) -> Result<f64, String> {
        let v = self.get(name)?;
        variant_get_f64(&v).ok_or_else(|| format!("'{name}' is not numeric"))
    }

    pub fn int(&self, name: &str) -> Result<i32, String> {
        Ok(self.number(name)? as i32)
    }

    /// Booleans and `MsoTriState` (-1 true, 0 false)
    pub fn flag(&self, name: &str) -> Result<bool, String> {
        Ok(variant_get_bool(&self.get(name)?).unwrap_or(false))
    }

    pub fn count(&self) -> Result<i32, String> {
        self.int("Count")
    }
}

fn to_object(v: &VARIANT, context: &str) -> Result<ComObject, String> {
    if let Some(inner) = variant_get_dispatch(v) {
        Ok(ComObject { inner })
    } else if variant_is_empty(v) {
        Err(format!("'{context}' returned nothing"))
    } else {
        Err(format!("'{context}' returned VT={} where an object was expected", vt(v).0))
    }
}

fn invoke_error(err: windows::core::Error, except: &EXCEPINFO, member: &str) -> String {
    if err.code() != DISP_E_EXCEPTION {
        return format!("Invoke('{member}') failed: {err}");
    }
    let description = except.bstrDescription.to_string();
    if description.is_empty() {
        format!("COM exception in '{member}'")
    } else {
        format!("COM exception in '{member}': {description}")
    }
}
