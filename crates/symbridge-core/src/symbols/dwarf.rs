//! DWARF-backed symbol table loading.
//!
//! Walks every compile unit of a binary once and records what lives directly
//! inside the unit or inside a named namespace:
//!
//! - `DW_TAG_namespace` (anonymous namespaces are transparent)
//! - `DW_TAG_variable`
//! - `DW_TAG_subprogram`, with parameter types and the variadic flag
//! - struct / class / union / enum types
//!
//! Anything nested inside a function or a type is not visible to unqualified
//! name lookup and is skipped. Type references are followed up to
//! `MAX_TYPE_REF_DEPTH` levels.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use gimli::{
    constants, AttributeValue, DebugTypeSignature, DebuggingInformationEntry, DwAte, DwTag, Dwarf, EndianArcSlice,
    RunTimeEndian, SectionId, Unit, UnitOffset, UnitSectionOffset, UnitType,
};
use object::{BinaryFormat, Object, ObjectSection, ObjectSymbol, SymbolKind};

use super::demangle::{is_mangled, map_dwarf_error, short_name};
use super::{ExternalSymbol, NamespaceHandle, SymbolTable};
use crate::ast::{BuiltinType, TagKind, TypeDesc};
use crate::error::{SymbridgeError, SymbridgeResult};

type OwnedReader = EndianArcSlice<RunTimeEndian>;
type OwnedDwarf = Dwarf<OwnedReader>;
type Entry<'abbrev, 'unit> = DebuggingInformationEntry<'abbrev, 'unit, OwnedReader>;

const MAX_TYPE_REF_DEPTH: usize = 32;

const DWARF_SECTIONS: &[(&str, &[&str])] = &[
    (".debug_abbrev", &[".debug_abbrev", "__debug_abbrev"]),
    (".debug_addr", &[".debug_addr", "__debug_addr"]),
    (".debug_info", &[".debug_info", "__debug_info"]),
    (".debug_line", &[".debug_line", "__debug_line"]),
    (".debug_line_str", &[".debug_line_str", "__debug_line_str"]),
    (".debug_ranges", &[".debug_ranges", "__debug_ranges"]),
    (".debug_rnglists", &[".debug_rnglists", "__debug_rnglists"]),
    (".debug_str", &[".debug_str", "__debug_str"]),
    (".debug_str_offsets", &[".debug_str_offsets", "__debug_str_offsets"]),
    (".debug_types", &[".debug_types", "__debug_types"]),
    (".debug_loc", &[".debug_loc", "__debug_loc"]),
    (".debug_loclists", &[".debug_loclists", "__debug_loclists"]),
];

/// Build a [`SymbolTable`] from the binary at `path`.
///
/// Unmangled text symbols from the object's symbol table that the debug
/// information did not describe are added at top level as functions of
/// unknown signature.
///
/// ## Errors
///
/// Returns an error if the file cannot be read, is not an object file, or
/// carries malformed DWARF.
pub fn load_symbol_table(path: &Path) -> SymbridgeResult<SymbolTable>
{
    let bytes = fs::read(path)?;
    let file = object::File::parse(&*bytes).map_err(|err| SymbridgeError::ObjectParse {
        path: path.to_path_buf(),
        details: err.to_string(),
    })?;

    let endian = if file.is_little_endian() {
        RunTimeEndian::Little
    } else {
        RunTimeEndian::Big
    };

    let mut sections = HashMap::new();
    for (canonical, aliases) in DWARF_SECTIONS {
        sections.insert(*canonical, load_section_bytes(&file, path, aliases)?);
    }

    let dwarf = Dwarf::load(|id| Ok::<_, gimli::Error>(section_reader(&sections, id, endian)))
        .map_err(|err| map_dwarf_error("loading DWARF sections", err))?;

    let mut table = SymbolTable::new();
    DwarfIndexer::new(&dwarf)?.index(&mut table)?;
    add_object_symbols(&file, &mut table);

    tracing::debug!(
        module = %path.display(),
        namespaces = table.namespace_count(),
        symbols = table.symbol_count(),
        "Indexed debug information"
    );
    Ok(table)
}

fn section_reader(sections: &HashMap<&'static str, Arc<[u8]>>, id: SectionId, endian: RunTimeEndian) -> OwnedReader
{
    let data = sections
        .get(id.name())
        .cloned()
        .unwrap_or_else(|| Arc::<[u8]>::from(Vec::new()));
    EndianArcSlice::new(data, endian)
}

fn load_section_bytes(file: &object::File<'_>, path: &Path, names: &[&str]) -> SymbridgeResult<Arc<[u8]>>
{
    for name in names {
        if let Some(section) = file.section_by_name(name) {
            let data = section.uncompressed_data().map_err(|err| SymbridgeError::ObjectParse {
                path: path.to_path_buf(),
                details: format!("failed to read {name}: {err}"),
            })?;
            return Ok(match data {
                Cow::Borrowed(bytes) => Arc::<[u8]>::from(bytes.to_vec()),
                Cow::Owned(vec) => vec.into(),
            });
        }
    }

    Ok(Arc::<[u8]>::from(Vec::new()))
}

fn add_object_symbols(file: &object::File<'_>, table: &mut SymbolTable)
{
    let strip_underscore = file.format() == BinaryFormat::MachO;
    for symbol in file.symbols() {
        if symbol.kind() != SymbolKind::Text || !symbol.is_global() || symbol.is_undefined() {
            continue;
        }
        let Ok(raw) = symbol.name() else {
            continue;
        };
        if is_mangled(raw) {
            continue;
        }
        let name = if strip_underscore {
            raw.strip_prefix('_').unwrap_or(raw)
        } else {
            raw
        };
        if name.is_empty() || table.has_symbol(None, name) {
            continue;
        }
        table.add_symbol(None, ExternalSymbol::unknown_function(name));
    }
}

/// Where the entry currently being visited sits.
#[derive(Debug, Clone, Copy)]
enum Scope
{
    /// Directly inside a compile unit.
    Unit,
    /// Directly inside the namespace at this index of the handle list.
    Namespace(usize),
    /// Inside a function, type or other construct lookup does not see into.
    Opaque,
}

struct DwarfIndexer<'a>
{
    dwarf: &'a OwnedDwarf,
    units: Vec<Unit<OwnedReader>>,
    type_units: Vec<Unit<OwnedReader>>,
}

impl<'a> DwarfIndexer<'a>
{
    fn new(dwarf: &'a OwnedDwarf) -> SymbridgeResult<Self>
    {
        let mut units = Vec::new();
        let mut headers = dwarf.units();
        while let Some(header) = headers
            .next()
            .map_err(|err| map_dwarf_error("reading .debug_info unit header", err))?
        {
            units.push(
                dwarf
                    .unit(header)
                    .map_err(|err| map_dwarf_error("parsing compilation unit", err))?,
            );
        }

        let mut type_units = Vec::new();
        let mut type_headers = dwarf.type_units();
        while let Some(header) = type_headers
            .next()
            .map_err(|err| map_dwarf_error("reading .debug_types unit header", err))?
        {
            type_units.push(dwarf.unit(header).map_err(|err| map_dwarf_error("parsing type unit", err))?);
        }

        Ok(Self {
            dwarf,
            units,
            type_units,
        })
    }

    fn index(&self, table: &mut SymbolTable) -> SymbridgeResult<()>
    {
        let mut namespaces = Vec::new();
        for unit in &self.units {
            self.index_unit(unit, table, &mut namespaces)?;
        }
        Ok(())
    }

    fn index_unit(
        &self,
        unit: &Unit<OwnedReader>,
        table: &mut SymbolTable,
        namespaces: &mut Vec<NamespaceHandle>,
    ) -> SymbridgeResult<()>
    {
        // scopes[d] is the scope established by the entry at depth d.
        let mut scopes: Vec<Scope> = Vec::new();
        let mut depth: isize = 0;
        let mut cursor = unit.entries();
        while let Some((delta, entry)) = cursor.next_dfs().map_err(|err| map_dwarf_error("traversing DIE tree", err))? {
            depth += delta;
            let level = usize::try_from(depth).unwrap_or(0);
            scopes.truncate(level);

            let scope = if level == 0 {
                Scope::Unit
            } else {
                match scopes.last().copied().unwrap_or(Scope::Opaque) {
                    Scope::Opaque => Scope::Opaque,
                    Scope::Unit => self.index_entry(unit, entry, Scope::Unit, table, namespaces)?,
                    parent @ Scope::Namespace(_) => self.index_entry(unit, entry, parent, table, namespaces)?,
                }
            };
            scopes.push(scope);
        }
        Ok(())
    }

    /// Record `entry` if lookup can see it and return the scope it opens.
    fn index_entry(
        &self,
        unit: &Unit<OwnedReader>,
        entry: &Entry<'_, '_>,
        parent: Scope,
        table: &mut SymbolTable,
        namespaces: &mut Vec<NamespaceHandle>,
    ) -> SymbridgeResult<Scope>
    {
        let parent_handle = |namespaces: &[NamespaceHandle]| match parent {
            Scope::Namespace(index) => namespaces.get(index).cloned(),
            _ => None,
        };

        match entry.tag() {
            constants::DW_TAG_namespace => {
                let Some(name) = self.entry_name(unit, entry)? else {
                    return Ok(parent);
                };
                let handle = table.add_namespace(parent_handle(namespaces.as_slice()).as_ref(), &name);
                namespaces.push(handle);
                Ok(Scope::Namespace(namespaces.len() - 1))
            }
            constants::DW_TAG_variable => {
                if let Some(symbol) = self.variable_symbol(unit, entry)? {
                    table.add_symbol(parent_handle(namespaces.as_slice()).as_ref(), symbol);
                }
                Ok(Scope::Opaque)
            }
            constants::DW_TAG_subprogram => {
                if let Some(symbol) = self.function_symbol(unit, entry)? {
                    table.add_symbol(parent_handle(namespaces.as_slice()).as_ref(), symbol);
                }
                Ok(Scope::Opaque)
            }
            tag @ (constants::DW_TAG_structure_type
            | constants::DW_TAG_class_type
            | constants::DW_TAG_union_type
            | constants::DW_TAG_enumeration_type) => {
                if let Some(name) = self.entry_name(unit, entry)? {
                    let ty = TypeDesc::record(tag_kind(tag), name.clone());
                    table.add_symbol(parent_handle(namespaces.as_slice()).as_ref(), ExternalSymbol::type_decl(name, ty));
                }
                Ok(Scope::Opaque)
            }
            _ => Ok(Scope::Opaque),
        }
    }

    fn variable_symbol(&self, unit: &Unit<OwnedReader>, entry: &Entry<'_, '_>) -> SymbridgeResult<Option<ExternalSymbol>>
    {
        if self.refers_elsewhere(entry)? {
            return Ok(None);
        }
        let Some(name) = self.entry_name(unit, entry)? else {
            return Ok(None);
        };
        let Some(attr) = entry
            .attr(constants::DW_AT_type)
            .map_err(|err| map_dwarf_error("reading variable type", err))?
        else {
            return Ok(None);
        };
        let ty = self.resolve_type(unit, attr.value(), 0)?;
        Ok(Some(ExternalSymbol::variable(name, ty)))
    }

    fn function_symbol(&self, unit: &Unit<OwnedReader>, entry: &Entry<'_, '_>) -> SymbridgeResult<Option<ExternalSymbol>>
    {
        if self.refers_elsewhere(entry)? {
            return Ok(None);
        }
        let Some(name) = self.entry_name(unit, entry)? else {
            return Ok(None);
        };
        let signature = self.function_signature(unit, entry, 0)?;
        Ok(Some(ExternalSymbol::function(name, signature)))
    }

    /// Out-of-line definitions and inlined instances borrow their name from
    /// another entry; the entry they point at is indexed instead.
    fn refers_elsewhere(&self, entry: &Entry<'_, '_>) -> SymbridgeResult<bool>
    {
        for attribute in [constants::DW_AT_specification, constants::DW_AT_abstract_origin] {
            if entry
                .attr(attribute)
                .map_err(|err| map_dwarf_error("reading entry reference", err))?
                .is_some()
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn function_signature(&self, unit: &Unit<OwnedReader>, entry: &Entry<'_, '_>, depth: usize) -> SymbridgeResult<TypeDesc>
    {
        let result = self.inner_type(unit, entry, depth, TypeDesc::Builtin(BuiltinType::Void))?;

        let mut params = Vec::new();
        let mut variadic = false;
        let mut tree = unit
            .entries_tree(Some(entry.offset()))
            .map_err(|err| map_dwarf_error("building parameter tree", err))?;
        let root = tree.root().map_err(|err| map_dwarf_error("navigating parameter root", err))?;
        let mut children = root.children();
        while let Some(child) = children
            .next()
            .map_err(|err| map_dwarf_error("iterating parameters", err))?
        {
            let child_entry = child.entry().clone();
            match child_entry.tag() {
                constants::DW_TAG_formal_parameter => {
                    params.push(self.inner_type(unit, &child_entry, depth, TypeDesc::unknown())?);
                }
                constants::DW_TAG_unspecified_parameters => variadic = true,
                _ => {}
            }
        }

        Ok(TypeDesc::Function {
            result: Box::new(result),
            params,
            variadic,
        })
    }

    /// Type named by the entry's `DW_AT_type`, or `fallback` when it has none.
    fn inner_type(
        &self,
        unit: &Unit<OwnedReader>,
        entry: &Entry<'_, '_>,
        depth: usize,
        fallback: TypeDesc,
    ) -> SymbridgeResult<TypeDesc>
    {
        match entry
            .attr(constants::DW_AT_type)
            .map_err(|err| map_dwarf_error("reading DW_AT_type", err))?
        {
            Some(attr) => self.resolve_type(unit, attr.value(), depth),
            None => Ok(fallback),
        }
    }

    fn resolve_type(
        &self,
        unit: &Unit<OwnedReader>,
        value: AttributeValue<OwnedReader>,
        depth: usize,
    ) -> SymbridgeResult<TypeDesc>
    {
        if depth >= MAX_TYPE_REF_DEPTH {
            return Ok(TypeDesc::unknown());
        }

        match value {
            AttributeValue::UnitRef(offset) => self.describe_type_at(unit, offset, depth + 1),
            AttributeValue::DebugInfoRef(offset) => {
                let target = UnitSectionOffset::from(offset);
                match self.find_unit_for_offset(target) {
                    Some((target_unit, unit_offset)) => self.describe_type_at(target_unit, unit_offset, depth + 1),
                    None => Ok(TypeDesc::unknown()),
                }
            }
            AttributeValue::DebugTypesRef(signature) => self.describe_type_for_signature(signature, depth + 1),
            _ => Ok(TypeDesc::unknown()),
        }
    }

    fn describe_type_at(&self, unit: &Unit<OwnedReader>, offset: UnitOffset<usize>, depth: usize) -> SymbridgeResult<TypeDesc>
    {
        let die = unit
            .entry(offset)
            .map_err(|err| map_dwarf_error("resolving type reference", err))?;

        match die.tag() {
            constants::DW_TAG_base_type => Ok(TypeDesc::Builtin(self.base_type(&die)?)),
            constants::DW_TAG_pointer_type
            | constants::DW_TAG_reference_type
            | constants::DW_TAG_rvalue_reference_type
            | constants::DW_TAG_ptr_to_member_type => Ok(TypeDesc::pointer_to(self.inner_type(
                unit,
                &die,
                depth,
                TypeDesc::Builtin(BuiltinType::Void),
            )?)),
            constants::DW_TAG_array_type => Ok(TypeDesc::pointer_to(self.inner_type(unit, &die, depth, TypeDesc::unknown())?)),
            constants::DW_TAG_const_type
            | constants::DW_TAG_volatile_type
            | constants::DW_TAG_restrict_type
            | constants::DW_TAG_atomic_type
            | constants::DW_TAG_typedef => self.inner_type(unit, &die, depth, TypeDesc::Builtin(BuiltinType::Void)),
            tag @ (constants::DW_TAG_structure_type
            | constants::DW_TAG_class_type
            | constants::DW_TAG_union_type
            | constants::DW_TAG_enumeration_type) => {
                let name = self
                    .entry_name(unit, &die)?
                    .unwrap_or_else(|| "<anonymous>".to_string());
                Ok(TypeDesc::record(tag_kind(tag), name))
            }
            constants::DW_TAG_subroutine_type => self.function_signature(unit, &die, depth),
            _ => Ok(TypeDesc::unknown()),
        }
    }

    fn describe_type_for_signature(&self, signature: DebugTypeSignature, depth: usize) -> SymbridgeResult<TypeDesc>
    {
        for unit in &self.type_units {
            match unit.header.type_() {
                UnitType::Type {
                    type_signature,
                    type_offset,
                }
                | UnitType::SplitType {
                    type_signature,
                    type_offset,
                } if type_signature == signature => {
                    return self.describe_type_at(unit, type_offset, depth + 1);
                }
                _ => {}
            }
        }
        Ok(TypeDesc::unknown())
    }

    fn find_unit_for_offset(&self, target: UnitSectionOffset<usize>) -> Option<(&Unit<OwnedReader>, UnitOffset<usize>)>
    {
        self.units
            .iter()
            .find_map(|unit| target.to_unit_offset(unit).map(|offset| (unit, offset)))
    }

    fn base_type(&self, die: &Entry<'_, '_>) -> SymbridgeResult<BuiltinType>
    {
        let encoding = match die
            .attr(constants::DW_AT_encoding)
            .map_err(|err| map_dwarf_error("reading DW_AT_encoding", err))?
            .map(|attr| attr.value())
        {
            Some(AttributeValue::Encoding(encoding)) => Some(encoding),
            _ => None,
        };
        let size = die
            .attr(constants::DW_AT_byte_size)
            .map_err(|err| map_dwarf_error("reading DW_AT_byte_size", err))?
            .and_then(|attr| attr.udata_value());
        Ok(builtin_for(encoding, size))
    }

    /// `DW_AT_name`, falling back to the demangled tail of a Rust
    /// `DW_AT_linkage_name`.
    fn entry_name(&self, unit: &Unit<OwnedReader>, entry: &Entry<'_, '_>) -> SymbridgeResult<Option<String>>
    {
        if let Some(attr) = entry
            .attr(constants::DW_AT_name)
            .map_err(|err| map_dwarf_error("reading DW_AT_name", err))?
        {
            return Ok(Some(self.attr_to_string(unit, attr.value())?));
        }
        if let Some(attr) = entry
            .attr(constants::DW_AT_linkage_name)
            .map_err(|err| map_dwarf_error("reading DW_AT_linkage_name", err))?
        {
            let raw = self.attr_to_string(unit, attr.value())?;
            return Ok(short_name(&raw));
        }
        Ok(None)
    }

    fn attr_to_string(&self, unit: &Unit<OwnedReader>, value: AttributeValue<OwnedReader>) -> SymbridgeResult<String>
    {
        let reader = self
            .dwarf
            .attr_string(unit, value)
            .map_err(|err| map_dwarf_error("resolving DWARF string", err))?;
        let owned = match gimli::Reader::to_string(&reader) {
            Ok(cow) => cow.into_owned(),
            Err(_) => gimli::Reader::to_string_lossy(&reader)
                .map_err(|err| map_dwarf_error("decoding DWARF string", err))?
                .into_owned(),
        };
        Ok(owned)
    }
}

fn tag_kind(tag: DwTag) -> TagKind
{
    match tag {
        constants::DW_TAG_class_type => TagKind::Class,
        constants::DW_TAG_union_type => TagKind::Union,
        constants::DW_TAG_enumeration_type => TagKind::Enum,
        _ => TagKind::Struct,
    }
}

fn builtin_for(encoding: Option<DwAte>, size: Option<u64>) -> BuiltinType
{
    match (encoding, size) {
        (_, Some(0)) => BuiltinType::Void,
        (Some(constants::DW_ATE_boolean), _) => BuiltinType::Bool,
        (Some(constants::DW_ATE_float), Some(4)) => BuiltinType::Float,
        (Some(constants::DW_ATE_float), Some(8)) => BuiltinType::Double,
        (Some(constants::DW_ATE_float), _) => BuiltinType::LongDouble,
        (Some(constants::DW_ATE_signed_char), _) => BuiltinType::Char,
        (Some(constants::DW_ATE_unsigned_char), _) => BuiltinType::UChar,
        (Some(constants::DW_ATE_signed), Some(1)) => BuiltinType::SChar,
        (Some(constants::DW_ATE_signed), Some(2)) => BuiltinType::Short,
        (Some(constants::DW_ATE_signed), Some(4)) => BuiltinType::Int,
        (Some(constants::DW_ATE_signed), Some(8)) => BuiltinType::Long,
        (Some(constants::DW_ATE_signed), Some(16)) => BuiltinType::Int128,
        (Some(constants::DW_ATE_unsigned | constants::DW_ATE_UTF), Some(1)) => BuiltinType::UChar,
        (Some(constants::DW_ATE_unsigned | constants::DW_ATE_UTF), Some(2)) => BuiltinType::UShort,
        (Some(constants::DW_ATE_unsigned | constants::DW_ATE_UTF), Some(4)) => BuiltinType::UInt,
        (Some(constants::DW_ATE_unsigned), Some(8)) => BuiltinType::ULong,
        (Some(constants::DW_ATE_unsigned), Some(16)) => BuiltinType::UInt128,
        _ => BuiltinType::UnknownAny,
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_builtin_for_integer_encodings()
    {
        assert_eq!(builtin_for(Some(constants::DW_ATE_signed), Some(4)), BuiltinType::Int);
        assert_eq!(builtin_for(Some(constants::DW_ATE_unsigned), Some(8)), BuiltinType::ULong);
        assert_eq!(builtin_for(Some(constants::DW_ATE_signed), Some(16)), BuiltinType::Int128);
        assert_eq!(builtin_for(Some(constants::DW_ATE_UTF), Some(4)), BuiltinType::UInt);
    }

    #[test]
    fn test_builtin_for_other_encodings()
    {
        assert_eq!(builtin_for(Some(constants::DW_ATE_boolean), Some(1)), BuiltinType::Bool);
        assert_eq!(builtin_for(Some(constants::DW_ATE_float), Some(8)), BuiltinType::Double);
        assert_eq!(builtin_for(Some(constants::DW_ATE_float), Some(16)), BuiltinType::LongDouble);
        assert_eq!(builtin_for(Some(constants::DW_ATE_signed_char), Some(1)), BuiltinType::Char);
        assert_eq!(builtin_for(None, Some(0)), BuiltinType::Void);
        assert_eq!(builtin_for(None, None), BuiltinType::UnknownAny);
    }

    #[test]
    fn test_tag_kind()
    {
        assert_eq!(tag_kind(constants::DW_TAG_structure_type), TagKind::Struct);
        assert_eq!(tag_kind(constants::DW_TAG_class_type), TagKind::Class);
        assert_eq!(tag_kind(constants::DW_TAG_union_type), TagKind::Union);
        assert_eq!(tag_kind(constants::DW_TAG_enumeration_type), TagKind::Enum);
    }

    #[test]
    fn test_load_rejects_non_object_files()
    {
        let path = std::env::temp_dir().join(format!("symbridge-not-an-object-{}", std::process::id()));
        fs::write(&path, b"definitely not an object file").expect("write temp file");
        let result = load_symbol_table(&path);
        let _ = fs::remove_file(&path);
        assert!(matches!(result, Err(SymbridgeError::ObjectParse { .. })));
    }
}
