// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generated from EXPRESS schema: IFC4X3_DEV_923b0514
//!
//! The `ifc_types!` macro is the "code generator": entity names, their
//! EXPRESS supertype and local attribute list are declared once here and
//! expanded into the `IfcType` enum plus the lookup tables the rest of the
//! engine treats as a read-only, process-wide registry (component C4).
//! Regenerating this file from a newer EXPRESS schema means re-running the
//! (external, not part of this crate) schema compiler over this macro input
//! — nothing downstream should hand-maintain an `IfcType` match.

use std::fmt;

/// Attribute aggregation kind, as EXPRESS `LIST`/`ARRAY`/`SET` declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    None,
    List,
    Array,
    Set,
}

/// One locally-declared attribute of an entity (inherited attributes are
/// not repeated here; see [`EntitySchema::all_attributes`]).
#[derive(Debug, Clone, Copy)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub type_name: &'static str,
    pub optional: bool,
    pub aggregation: Aggregation,
    /// `(lo, hi)` cardinality bound; `hi = None` means unbounded.
    pub bounds: (u32, Option<u32>),
}

const fn attr(name: &'static str, type_name: &'static str, optional: bool) -> AttributeSpec {
    AttributeSpec {
        name,
        type_name,
        optional,
        aggregation: Aggregation::None,
        bounds: (1, Some(1)),
    }
}

const fn attr_list(
    name: &'static str,
    type_name: &'static str,
    optional: bool,
    lo: u32,
    hi: Option<u32>,
) -> AttributeSpec {
    AttributeSpec {
        name,
        type_name,
        optional,
        aggregation: Aggregation::List,
        bounds: (lo, hi),
    }
}

/// Static schema metadata for one entity type.
pub struct EntitySchema {
    pub name: &'static str,
    pub is_abstract: bool,
    pub supertype: Option<IfcType>,
    pub local_attributes: &'static [AttributeSpec],
}

macro_rules! ifc_types {
    (
        $(
            $variant:ident => $name:literal
            $(, super: $super:ident)?
            $(, abstract: $is_abstract:literal)?
            $(, attrs: [ $($attr:expr),* $(,)? ])?
        );* $(;)?
    ) => {
        /// IFC entity types. The `Unknown` variant stores a cheap string
        /// hash so unrecognized EXPRESS names (future schema versions,
        /// vendor extensions) still round-trip through the store instead
        /// of failing the whole load.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum IfcType {
            $($variant,)*
            Unknown(u16),
        }

        impl IfcType {
            /// Parse a canonical, uppercase EXPRESS type name (`IFCWALL`) into
            /// its enum representation. Unrecognized names hash into `Unknown`
            /// rather than failing — the schema registry is additive, not a
            /// validator (see spec.md §7, `UnknownType`).
            pub fn from_str(s: &str) -> Option<Self> {
                Some(match s {
                    $($name => Self::$variant,)*
                    other => Self::Unknown(simple_hash(other)),
                })
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                    Self::Unknown(_) => "UNKNOWN",
                }
            }

            /// Stable, dense index for columnar storage (`typeEnum`). The
            /// `Unknown` bucket always sorts last.
            pub const fn type_id(&self) -> u16 {
                let mut i: u16 = 0;
                $(
                    if matches!(self, Self::$variant) { return i; }
                    i += 1;
                )*
                let _ = i;
                u16::MAX
            }

            pub fn supertype(&self) -> Option<IfcType> {
                match self {
                    $(Self::$variant => ifc_types!(@super $($super)?),)*
                    Self::Unknown(_) => None,
                }
            }

            pub fn is_abstract(&self) -> bool {
                match self {
                    $(Self::$variant => ifc_types!(@is_abstract $($is_abstract)?),)*
                    Self::Unknown(_) => false,
                }
            }

            /// Root-first chain of supertypes including `self`.
            pub fn inheritance_chain(&self) -> Vec<IfcType> {
                let mut chain = Vec::new();
                let mut cur = Some(*self);
                while let Some(t) = cur {
                    chain.push(t);
                    cur = t.supertype();
                }
                chain.reverse();
                chain
            }

            pub fn local_attributes(&self) -> &'static [AttributeSpec] {
                match self {
                    $(Self::$variant => ifc_types!(@attrs $([ $($attr),* ])?),)*
                    Self::Unknown(_) => &[],
                }
            }

            /// Inherited chain flattened, root first then this type's own
            /// locally-declared attributes — matches the decoder's arity
            /// check, which only ever sees local attributes per row.
            pub fn all_attributes(&self) -> Vec<AttributeSpec> {
                let mut out = Vec::new();
                for t in self.inheritance_chain() {
                    out.extend_from_slice(t.local_attributes());
                }
                out
            }

            /// Assemble the [`EntitySchema`] view for this type on demand.
            /// Not cached: callers that hit this in a hot loop should cache
            /// the result themselves (the store's builder does, keyed by
            /// `type_id`).
            pub fn entity_schema(&self) -> EntitySchema {
                EntitySchema {
                    name: self.as_str(),
                    is_abstract: self.is_abstract(),
                    supertype: self.supertype(),
                    local_attributes: match self {
                        $(Self::$variant => ifc_types!(@attrs $([ $($attr),* ])?),)*
                        Self::Unknown(_) => &[],
                    },
                }
            }

            pub fn is_spatial(&self) -> bool {
                matches!(
                    self,
                    Self::IfcProject
                        | Self::IfcSite
                        | Self::IfcBuilding
                        | Self::IfcBuildingStorey
                        | Self::IfcSpace
                )
            }

            pub fn is_relationship(&self) -> bool {
                self.as_str().starts_with("IFCREL")
            }

            pub fn is_type_object(&self) -> bool {
                let s = self.as_str();
                s.ends_with("TYPE") || matches!(self.supertype(), Some(t) if t.as_str() == "IFCTYPEOBJECT")
            }
        }

        impl fmt::Display for IfcType {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        /// All concrete (non-`Unknown`) type names, in declaration order —
        /// used by tests and by the `type_id` binary-search invariant check.
        pub const ALL_TYPE_NAMES: &[&str] = &[$($name),*];
    };

    (@super) => { None };
    (@super $super:ident) => { Some(IfcType::$super) };
    (@is_abstract) => { false };
    (@is_abstract $v:literal) => { $v };
    (@attrs) => { &[] };
    (@attrs [ $($attr:expr),* ]) => { &[ $($attr),* ] };
}

ifc_types! {
    // --- Root / relationships ---
    IfcRoot => "IFCROOT", abstract: true,
        attrs: [attr("GlobalId", "IfcGloballyUniqueId", false),
                attr("OwnerHistory", "IfcOwnerHistory", true),
                attr("Name", "IfcLabel", true),
                attr("Description", "IfcText", true)];
    IfcObjectDefinition => "IFCOBJECTDEFINITION", super: IfcRoot, abstract: true;
    IfcObject => "IFCOBJECT", super: IfcObjectDefinition, abstract: true,
        attrs: [attr("ObjectType", "IfcLabel", true)];
    IfcProduct => "IFCPRODUCT", super: IfcObject, abstract: true,
        attrs: [attr("ObjectPlacement", "IfcObjectPlacement", true),
                attr("Representation", "IfcProductRepresentation", true)];
    IfcSpatialElement => "IFCSPATIALELEMENT", super: IfcProduct, abstract: true,
        attrs: [attr("LongName", "IfcLabel", true)];
    IfcSpatialStructureElement => "IFCSPATIALSTRUCTUREELEMENT", super: IfcSpatialElement, abstract: true,
        attrs: [attr("CompositionType", "IfcElementCompositionEnum", true)];
    IfcElement => "IFCELEMENT", super: IfcProduct, abstract: true,
        attrs: [attr("Tag", "IfcIdentifier", true)];
    IfcBuiltElement => "IFCBUILTELEMENT", super: IfcElement, abstract: true;
    IfcBuiltElementType => "IFCBUILTELEMENTTYPE", super: IfcTypeProduct, abstract: true;
    IfcTypeObject => "IFCTYPEOBJECT", super: IfcObjectDefinition, abstract: true;
    IfcTypeProduct => "IFCTYPEPRODUCT", super: IfcTypeObject, abstract: true;

    // --- Project hierarchy ---
    IfcProject => "IFCPROJECT", super: IfcObject,
        attrs: [attr("LongName", "IfcLabel", true),
                attr("Phase", "IfcLabel", true),
                attr_list("RepresentationContexts", "IfcRepresentationContext", true, 0, None),
                attr("UnitsInContext", "IfcUnitAssignment", true)];
    IfcSite => "IFCSITE", super: IfcSpatialStructureElement,
        attrs: [attr("RefLatitude", "IfcCompoundPlaneAngleMeasure", true),
                attr("RefLongitude", "IfcCompoundPlaneAngleMeasure", true),
                attr("RefElevation", "IfcLengthMeasure", true),
                attr("LandTitleNumber", "IfcLabel", true),
                attr("SiteAddress", "IfcPostalAddress", true)];
    IfcBuilding => "IFCBUILDING", super: IfcSpatialStructureElement,
        attrs: [attr("ElevationOfRefHeight", "IfcLengthMeasure", true),
                attr("ElevationOfTerrain", "IfcLengthMeasure", true),
                attr("BuildingAddress", "IfcPostalAddress", true)];
    IfcBuildingStorey => "IFCBUILDINGSTOREY", super: IfcSpatialStructureElement,
        attrs: [attr("Elevation", "IfcLengthMeasure", true)];
    IfcSpace => "IFCSPACE", super: IfcSpatialStructureElement,
        attrs: [attr("PredefinedType", "IfcSpaceTypeEnum", true), attr("ElevationWithFlooring", "IfcLengthMeasure", true)];

    // --- Building elements ---
    IfcWall => "IFCWALL", super: IfcBuiltElement, attrs: [attr("PredefinedType", "IfcWallTypeEnum", true)];
    IfcWallStandardCase => "IFCWALLSTANDARDCASE", super: IfcWall;
    IfcSlab => "IFCSLAB", super: IfcBuiltElement, attrs: [attr("PredefinedType", "IfcSlabTypeEnum", true)];
    IfcBeam => "IFCBEAM", super: IfcBuiltElement, attrs: [attr("PredefinedType", "IfcBeamTypeEnum", true)];
    IfcColumn => "IFCCOLUMN", super: IfcBuiltElement, attrs: [attr("PredefinedType", "IfcColumnTypeEnum", true)];
    IfcRoof => "IFCROOF", super: IfcBuiltElement, attrs: [attr("PredefinedType", "IfcRoofTypeEnum", true)];
    IfcStair => "IFCSTAIR", super: IfcBuiltElement, attrs: [attr("PredefinedType", "IfcStairTypeEnum", true)];
    IfcRamp => "IFCRAMP", super: IfcBuiltElement, attrs: [attr("PredefinedType", "IfcRampTypeEnum", true)];
    IfcRailing => "IFCRAILING", super: IfcBuiltElement, attrs: [attr("PredefinedType", "IfcRailingTypeEnum", true)];
    IfcCurtainWall => "IFCCURTAINWALL", super: IfcBuiltElement;
    IfcPlate => "IFCPLATE", super: IfcBuiltElement, attrs: [attr("PredefinedType", "IfcPlateTypeEnum", true)];
    IfcMember => "IFCMEMBER", super: IfcBuiltElement, attrs: [attr("PredefinedType", "IfcMemberTypeEnum", true)];
    IfcFooting => "IFCFOOTING", super: IfcBuiltElement;
    IfcPile => "IFCPILE", super: IfcBuiltElement;
    IfcCovering => "IFCCOVERING", super: IfcBuiltElement;
    IfcChimney => "IFCCHIMNEY", super: IfcBuiltElement;
    IfcShadingDevice => "IFCSHADINGDEVICE", super: IfcBuiltElement;
    IfcBuildingElementPart => "IFCBUILDINGELEMENTPART", super: IfcBuiltElement;
    IfcBuildingElementProxy => "IFCBUILDINGELEMENTPROXY", super: IfcBuiltElement;

    IfcDoor => "IFCDOOR", super: IfcBuiltElement,
        attrs: [attr("OverallHeight", "IfcPositiveLengthMeasure", true), attr("OverallWidth", "IfcPositiveLengthMeasure", true), attr("PredefinedType", "IfcDoorTypeEnum", true)];
    IfcWindow => "IFCWINDOW", super: IfcBuiltElement,
        attrs: [attr("OverallHeight", "IfcPositiveLengthMeasure", true), attr("OverallWidth", "IfcPositiveLengthMeasure", true), attr("PredefinedType", "IfcWindowTypeEnum", true)];
    IfcOpeningElement => "IFCOPENINGELEMENT", super: IfcElement, attrs: [attr("PredefinedType", "IfcOpeningElementTypeEnum", true)];
    IfcDoorType => "IFCDOORTYPE", super: IfcBuiltElementType;
    IfcWindowType => "IFCWINDOWTYPE", super: IfcBuiltElementType;

    // --- MEP / furniture / annotation ---
    IfcDistributionElement => "IFCDISTRIBUTIONELEMENT", super: IfcElement, abstract: true;
    IfcFlowSegment => "IFCFLOWSEGMENT", super: IfcDistributionElement, abstract: true;
    IfcFlowFitting => "IFCFLOWFITTING", super: IfcDistributionElement, abstract: true;
    IfcFlowTerminal => "IFCFLOWTERMINAL", super: IfcDistributionElement, abstract: true;
    IfcPipeSegment => "IFCPIPESEGMENT", super: IfcFlowSegment;
    IfcDuctSegment => "IFCDUCTSEGMENT", super: IfcFlowSegment;
    IfcCableSegment => "IFCCABLESEGMENT", super: IfcFlowSegment;
    IfcFurnishingElement => "IFCFURNISHINGELEMENT", super: IfcElement;
    IfcFurniture => "IFCFURNITURE", super: IfcFurnishingElement;
    IfcAnnotation => "IFCANNOTATION", super: IfcProduct;
    IfcGrid => "IFCGRID", super: IfcProduct;

    // --- Relationships ---
    IfcRelationship => "IFCRELATIONSHIP", super: IfcRoot, abstract: true;
    IfcRelAggregates => "IFCRELAGGREGATES", super: IfcRelationship,
        attrs: [attr("RelatingObject", "IfcObjectDefinition", false), attr_list("RelatedObjects", "IfcObjectDefinition", false, 1, None)];
    IfcRelContainedInSpatialStructure => "IFCRELCONTAINEDINSPATIALSTRUCTURE", super: IfcRelationship,
        attrs: [attr_list("RelatedElements", "IfcProduct", false, 1, None), attr("RelatingStructure", "IfcSpatialElement", false)];
    IfcRelDefinesByProperties => "IFCRELDEFINESBYPROPERTIES", super: IfcRelationship,
        attrs: [attr_list("RelatedObjects", "IfcObjectDefinition", false, 1, None), attr("RelatingPropertyDefinition", "IfcPropertySetDefinition", false)];
    IfcRelDefinesByType => "IFCRELDEFINESBYTYPE", super: IfcRelationship,
        attrs: [attr_list("RelatedObjects", "IfcObject", false, 1, None), attr("RelatingType", "IfcTypeObject", false)];
    IfcRelAssociatesMaterial => "IFCRELASSOCIATESMATERIAL", super: IfcRelationship,
        attrs: [attr_list("RelatedObjects", "IfcDefinitionSelect", false, 1, None), attr("RelatingMaterial", "IfcMaterialSelect", false)];
    IfcRelAssociatesClassification => "IFCRELASSOCIATESCLASSIFICATION", super: IfcRelationship;
    IfcRelVoidsElement => "IFCRELVOIDSELEMENT", super: IfcRelationship,
        attrs: [attr("RelatingBuildingElement", "IfcElement", false), attr("RelatedOpeningElement", "IfcFeatureElementSubtraction", false)];
    IfcRelFillsElement => "IFCRELFILLSELEMENT", super: IfcRelationship,
        attrs: [attr("RelatingOpeningElement", "IfcOpeningElement", false), attr("RelatedBuildingElement", "IfcElement", false)];
    IfcRelConnectsPathElements => "IFCRELCONNECTSPATHELEMENTS", super: IfcRelationship;
    IfcRelConnectsElements => "IFCRELCONNECTSELEMENTS", super: IfcRelationship;
    IfcRelSpaceBoundary => "IFCRELSPACEBOUNDARY", super: IfcRelationship;
    IfcRelAssignsToGroup => "IFCRELASSIGNSTOGROUP", super: IfcRelationship;
    IfcRelAssignsToProduct => "IFCRELASSIGNSTOPRODUCT", super: IfcRelationship;
    IfcRelReferencedInSpatialStructure => "IFCRELREFERENCEDINSPATIALSTRUCTURE", super: IfcRelationship;

    // --- Properties / quantities ---
    IfcPropertySetDefinition => "IFCPROPERTYSETDEFINITION", super: IfcRoot, abstract: true;
    IfcPropertySet => "IFCPROPERTYSET", super: IfcPropertySetDefinition,
        attrs: [attr_list("HasProperties", "IfcProperty", false, 1, None)];
    IfcElementQuantity => "IFCELEMENTQUANTITY", super: IfcPropertySetDefinition,
        attrs: [attr("MethodOfMeasurement", "IfcLabel", true), attr_list("Quantities", "IfcPhysicalQuantity", false, 1, None)];
    IfcProperty => "IFCPROPERTY", super: IfcRoot, abstract: true;
    IfcPropertySingleValue => "IFCPROPERTYSINGLEVALUE", super: IfcProperty,
        attrs: [attr("NominalValue", "IfcValue", true), attr("Unit", "IfcUnit", true)];
    IfcPropertyEnumeratedValue => "IFCPROPERTYENUMERATEDVALUE", super: IfcProperty;
    IfcPhysicalQuantity => "IFCPHYSICALQUANTITY", super: IfcRoot, abstract: true;
    IfcQuantityLength => "IFCQUANTITYLENGTH", super: IfcPhysicalQuantity, attrs: [attr("LengthValue", "IfcLengthMeasure", false)];
    IfcQuantityArea => "IFCQUANTITYAREA", super: IfcPhysicalQuantity, attrs: [attr("AreaValue", "IfcAreaMeasure", false)];
    IfcQuantityVolume => "IFCQUANTITYVOLUME", super: IfcPhysicalQuantity, attrs: [attr("VolumeValue", "IfcVolumeMeasure", false)];
    IfcQuantityCount => "IFCQUANTITYCOUNT", super: IfcPhysicalQuantity, attrs: [attr("CountValue", "IfcCountMeasure", false)];
    IfcQuantityWeight => "IFCQUANTITYWEIGHT", super: IfcPhysicalQuantity, attrs: [attr("WeightValue", "IfcMassMeasure", false)];
    IfcQuantityTime => "IFCQUANTITYTIME", super: IfcPhysicalQuantity, attrs: [attr("TimeValue", "IfcTimeMeasure", false)];

    // --- Materials ---
    IfcMaterial => "IFCMATERIAL", attrs: [attr("Name", "IfcLabel", false)];
    IfcMaterialLayer => "IFCMATERIALLAYER";
    IfcMaterialLayerSet => "IFCMATERIALLAYERSET";
    IfcMaterialLayerSetUsage => "IFCMATERIALLAYERSETUSAGE";

    // --- Units ---
    IfcUnitAssignment => "IFCUNITASSIGNMENT", attrs: [attr_list("Units", "IfcUnit", false, 1, None)];
    IfcSIUnit => "IFCSIUNIT", attrs: [attr("Dimensions", "IfcDimensionalExponents", true), attr("UnitType", "IfcUnitEnum", false), attr("Prefix", "IfcSIPrefix", true), attr("Name", "IfcSIUnitName", false)];
    IfcConversionBasedUnit => "IFCCONVERSIONBASEDUNIT", attrs: [attr("Dimensions", "IfcDimensionalExponents", false), attr("UnitType", "IfcUnitEnum", false), attr("Name", "IfcLabel", false), attr("ConversionFactor", "IfcMeasureWithUnit", false)];

    // --- Geometry / representation ---
    IfcRepresentationContext => "IFCREPRESENTATIONCONTEXT", abstract: true;
    IfcGeometricRepresentationContext => "IFCGEOMETRICREPRESENTATIONCONTEXT", super: IfcRepresentationContext;
    IfcProductRepresentation => "IFCPRODUCTREPRESENTATION", abstract: true;
    IfcProductDefinitionShape => "IFCPRODUCTDEFINITIONSHAPE", super: IfcProductRepresentation,
        attrs: [attr_list("Representations", "IfcShapeModel", false, 1, None)];
    IfcRepresentation => "IFCREPRESENTATION", abstract: true;
    IfcShapeModel => "IFCSHAPEMODEL", super: IfcRepresentation, abstract: true;
    IfcShapeRepresentation => "IFCSHAPEREPRESENTATION", super: IfcShapeModel,
        attrs: [attr("RepresentationIdentifier", "IfcLabel", true), attr("RepresentationType", "IfcLabel", true), attr_list("Items", "IfcRepresentationItem", false, 1, None)];
    IfcRepresentationItem => "IFCREPRESENTATIONITEM", abstract: true;
    IfcRepresentationMap => "IFCREPRESENTATIONMAP",
        attrs: [attr("MappingOrigin", "IfcAxis2Placement", false), attr("MappedRepresentation", "IfcShapeRepresentation", false)];
    IfcMappedItem => "IFCMAPPEDITEM", super: IfcRepresentationItem,
        attrs: [attr("MappingSource", "IfcRepresentationMap", false), attr("MappingTarget", "IfcCartesianTransformationOperator", false)];

    IfcSolidModel => "IFCSOLIDMODEL", super: IfcRepresentationItem, abstract: true;
    IfcSweptAreaSolid => "IFCSWEPTAREASOLID", super: IfcSolidModel, abstract: true,
        attrs: [attr("SweptArea", "IfcProfileDef", false), attr("Position", "IfcAxis2Placement3D", true)];
    IfcExtrudedAreaSolid => "IFCEXTRUDEDAREASOLID", super: IfcSweptAreaSolid,
        attrs: [attr("ExtrudedDirection", "IfcDirection", false), attr("Depth", "IfcPositiveLengthMeasure", false)];
    IfcRevolvedAreaSolid => "IFCREVOLVEDAREASOLID", super: IfcSweptAreaSolid,
        attrs: [attr("Axis", "IfcAxis1Placement", false), attr("Angle", "IfcPlaneAngleMeasure", false)];
    IfcSweptDiskSolid => "IFCSWEPTDISKSOLID", super: IfcSolidModel,
        attrs: [attr("Directrix", "IfcCurve", false), attr("Radius", "IfcPositiveLengthMeasure", false), attr("InnerRadius", "IfcPositiveLengthMeasure", true), attr("StartParam", "IfcParameterValue", true), attr("EndParam", "IfcParameterValue", true)];
    IfcManifoldSolidBrep => "IFCMANIFOLDSOLIDBREP", super: IfcSolidModel, abstract: true,
        attrs: [attr("Outer", "IfcClosedShell", false)];
    IfcFacetedBrep => "IFCFACETEDBREP", super: IfcManifoldSolidBrep;
    IfcAdvancedBrep => "IFCADVANCEDBREP", super: IfcManifoldSolidBrep;
    IfcAdvancedBrepWithVoids => "IFCADVANCEDBREPWITHVOIDS", super: IfcAdvancedBrep;
    IfcFaceBasedSurfaceModel => "IFCFACEBASEDSURFACEMODEL", super: IfcRepresentationItem,
        attrs: [attr_list("FbsmFaces", "IfcConnectedFaceSet", false, 1, None)];
    IfcShellBasedSurfaceModel => "IFCSHELLBASEDSURFACEMODEL", super: IfcRepresentationItem;
    IfcTriangulatedFaceSet => "IFCTRIANGULATEDFACESET", super: IfcRepresentationItem,
        attrs: [attr("Coordinates", "IfcCartesianPointList3D", false), attr("Normals", "IfcParameterValue", true), attr("Closed", "IfcBoolean", true), attr_list("CoordIndex", "IfcPositiveInteger", false, 1, None)];
    IfcPolygonalFaceSet => "IFCPOLYGONALFACESET", super: IfcRepresentationItem,
        attrs: [attr("Coordinates", "IfcCartesianPointList3D", false), attr("Closed", "IfcBoolean", true), attr_list("Faces", "IfcIndexedPolygonalFace", false, 1, None), attr_list("PnIndex", "IfcPositiveInteger", true, 0, None)];
    IfcIndexedPolygonalFaceWithVoids => "IFCINDEXEDPOLYGONALFACEWITHVOIDS";
    IfcBooleanResult => "IFCBOOLEANRESULT", super: IfcSolidModel,
        attrs: [attr("Operator", "IfcBooleanOperator", false), attr("FirstOperand", "IfcBooleanOperand", false), attr("SecondOperand", "IfcBooleanOperand", false)];
    IfcBooleanClippingResult => "IFCBOOLEANCLIPPINGRESULT", super: IfcBooleanResult;
    IfcHalfSpaceSolid => "IFCHALFSPACESOLID",
        attrs: [attr("BaseSurface", "IfcSurface", false), attr("AgreementFlag", "IfcBoolean", false)];
    IfcPolygonalBoundedHalfSpace => "IFCPOLYGONALBOUNDEDHALFSPACE", super: IfcHalfSpaceSolid;
    IfcSurfaceOfLinearExtrusion => "IFCSURFACEOFLINEAREXTRUSION";
    IfcPlane => "IFCPLANE";

    // --- Profiles ---
    IfcProfileDef => "IFCPROFILEDEF", abstract: true,
        attrs: [attr("ProfileType", "IfcProfileTypeEnum", false), attr("ProfileName", "IfcLabel", true)];
    IfcParameterizedProfileDef => "IFCPARAMETERIZEDPROFILEDEF", super: IfcProfileDef, abstract: true,
        attrs: [attr("Position", "IfcAxis2Placement2D", true)];
    IfcRectangleProfileDef => "IFCRECTANGLEPROFILEDEF", super: IfcParameterizedProfileDef,
        attrs: [attr("XDim", "IfcPositiveLengthMeasure", false), attr("YDim", "IfcPositiveLengthMeasure", false)];
    IfcRectangleHollowProfileDef => "IFCRECTANGLEHOLLOWPROFILEDEF", super: IfcRectangleProfileDef,
        attrs: [attr("WallThickness", "IfcPositiveLengthMeasure", false), attr("InnerFilletRadius", "IfcNonNegativeLengthMeasure", true), attr("OuterFilletRadius", "IfcNonNegativeLengthMeasure", true)];
    IfcCircleProfileDef => "IFCCIRCLEPROFILEDEF", super: IfcParameterizedProfileDef,
        attrs: [attr("Radius", "IfcPositiveLengthMeasure", false)];
    IfcCircleHollowProfileDef => "IFCCIRCLEHOLLOWPROFILEDEF", super: IfcCircleProfileDef,
        attrs: [attr("WallThickness", "IfcPositiveLengthMeasure", false)];
    IfcEllipseProfileDef => "IFCELLIPSEPROFILEDEF", super: IfcParameterizedProfileDef,
        attrs: [attr("SemiAxis1", "IfcPositiveLengthMeasure", false), attr("SemiAxis2", "IfcPositiveLengthMeasure", false)];
    IfcIShapeProfileDef => "IFCISHAPEPROFILEDEF", super: IfcParameterizedProfileDef;
    IfcLShapeProfileDef => "IFCLSHAPEPROFILEDEF", super: IfcParameterizedProfileDef;
    IfcUShapeProfileDef => "IFCUSHAPEPROFILEDEF", super: IfcParameterizedProfileDef;
    IfcTShapeProfileDef => "IFCTSHAPEPROFILEDEF", super: IfcParameterizedProfileDef;
    IfcCShapeProfileDef => "IFCCSHAPEPROFILEDEF", super: IfcParameterizedProfileDef;
    IfcZShapeProfileDef => "IFCZSHAPEPROFILEDEF", super: IfcParameterizedProfileDef;
    IfcTrapeziumProfileDef => "IFCTRAPEZIUMPROFILEDEF", super: IfcParameterizedProfileDef;
    IfcArbitraryClosedProfileDef => "IFCARBITRARYCLOSEDPROFILEDEF", super: IfcProfileDef,
        attrs: [attr("OuterCurve", "IfcCurve", false)];
    IfcArbitraryProfileDefWithVoids => "IFCARBITRARYPROFILEDEFWITHVOIDS", super: IfcArbitraryClosedProfileDef,
        attrs: [attr_list("InnerCurves", "IfcCurve", false, 1, None)];
    IfcDerivedProfileDef => "IFCDERIVEDPROFILEDEF", super: IfcProfileDef,
        attrs: [attr("ParentProfile", "IfcProfileDef", false), attr("Operator", "IfcCartesianTransformationOperator2D", false), attr("Label", "IfcLabel", true)];
    IfcCompositeProfileDef => "IFCCOMPOSITEPROFILEDEF", super: IfcProfileDef,
        attrs: [attr_list("Profiles", "IfcProfileDef", false, 2, None)];

    // --- Curves / points / placements ---
    IfcCurve => "IFCCURVE", abstract: true;
    IfcLine => "IFCLINE", super: IfcCurve;
    IfcCircle => "IFCCIRCLE", super: IfcCurve,
        attrs: [attr("Position", "IfcAxis2Placement", false), attr("Radius", "IfcPositiveLengthMeasure", false)];
    IfcEllipse => "IFCELLIPSE", super: IfcCurve;
    IfcTrimmedCurve => "IFCTRIMMEDCURVE", super: IfcCurve;
    IfcCompositeCurve => "IFCCOMPOSITECURVE", super: IfcCurve,
        attrs: [attr_list("Segments", "IfcCompositeCurveSegment", false, 1, None), attr("SelfIntersect", "IfcLogical", false)];
    IfcCompositeCurveSegment => "IFCCOMPOSITECURVESEGMENT";
    IfcIndexedPolyCurve => "IFCINDEXEDPOLYCURVE", super: IfcCurve,
        attrs: [attr("Points", "IfcCartesianPointList", false), attr_list("Segments", "IfcSegmentIndexSelect", true, 1, None), attr("SelfIntersect", "IfcLogical", true)];
    IfcPolyline => "IFCPOLYLINE", super: IfcCurve,
        attrs: [attr_list("Points", "IfcCartesianPoint", false, 2, None)];

    IfcCartesianPointList => "IFCCARTESIANPOINTLIST", abstract: true;
    IfcCartesianPointList2D => "IFCCARTESIANPOINTLIST2D", super: IfcCartesianPointList,
        attrs: [attr_list("CoordList", "IfcLengthMeasure", false, 1, None)];
    IfcCartesianPointList3D => "IFCCARTESIANPOINTLIST3D", super: IfcCartesianPointList,
        attrs: [attr_list("CoordList", "IfcLengthMeasure", false, 1, None)];

    IfcPlacement => "IFCPLACEMENT", abstract: true,
        attrs: [attr("Location", "IfcCartesianPoint", false)];
    IfcAxis2Placement2D => "IFCAXIS2PLACEMENT2D", super: IfcPlacement,
        attrs: [attr("RefDirection", "IfcDirection", true)];
    IfcAxis2Placement3D => "IFCAXIS2PLACEMENT3D", super: IfcPlacement,
        attrs: [attr("Axis", "IfcDirection", true), attr("RefDirection", "IfcDirection", true)];
    IfcObjectPlacement => "IFCOBJECTPLACEMENT", abstract: true;
    IfcLocalPlacement => "IFCLOCALPLACEMENT", super: IfcObjectPlacement,
        attrs: [attr("PlacementRelTo", "IfcObjectPlacement", true), attr("RelativePlacement", "IfcAxis2Placement", false)];
    IfcCartesianPoint => "IFCCARTESIANPOINT",
        attrs: [attr_list("Coordinates", "IfcLengthMeasure", false, 1, 3)];
    IfcDirection => "IFCDIRECTION",
        attrs: [attr_list("DirectionRatios", "IfcReal", false, 2, 3)];
    IfcVector => "IFCVECTOR",
        attrs: [attr("Orientation", "IfcDirection", false), attr("Magnitude", "IfcLengthMeasure", false)];
    IfcCartesianTransformationOperator => "IFCCARTESIANTRANSFORMATIONOPERATOR", abstract: true;
    IfcCartesianTransformationOperator2D => "IFCCARTESIANTRANSFORMATIONOPERATOR2D", super: IfcCartesianTransformationOperator;
    IfcCartesianTransformationOperator3D => "IFCCARTESIANTRANSFORMATIONOPERATOR3D", super: IfcCartesianTransformationOperator;

    // --- Styling ---
    IfcStyledItem => "IFCSTYLEDITEM";
    IfcPresentationStyle => "IFCPRESENTATIONSTYLE", abstract: true;
    IfcSurfaceStyle => "IFCSURFACESTYLE", super: IfcPresentationStyle;

    // --- Georeferencing ---
    IfcMapConversion => "IFCMAPCONVERSION",
        attrs: [attr("SourceCRS", "IfcCoordinateReferenceSystemSelect", false), attr("TargetCRS", "IfcCoordinateReferenceSystem", false), attr("Eastings", "IfcLengthMeasure", false), attr("Northings", "IfcLengthMeasure", false), attr("OrthogonalHeight", "IfcLengthMeasure", false), attr("XAxisAbscissa", "IfcReal", true), attr("XAxisOrdinate", "IfcReal", true), attr("Scale", "IfcReal", true)];
    IfcProjectedCRS => "IFCPROJECTEDCRS",
        attrs: [attr("Name", "IfcLabel", false), attr("Description", "IfcText", true), attr("GeodeticDatum", "IfcIdentifier", true), attr("VerticalDatum", "IfcIdentifier", true), attr("MapProjection", "IfcIdentifier", true), attr("MapZone", "IfcIdentifier", true)];

    // --- Admin ---
    IfcOwnerHistory => "IFCOWNERHISTORY";
    IfcPerson => "IFCPERSON";
    IfcOrganization => "IFCORGANIZATION";
    IfcApplication => "IFCAPPLICATION";
}

/// Simple DJB2-style hash for unrecognized type names.
fn simple_hash(s: &str) -> u16 {
    let mut hash: u32 = 5381;
    for byte in s.bytes() {
        hash = ((hash << 5).wrapping_add(hash)).wrapping_add(byte as u32);
    }
    (hash & 0xFFFF) as u16
}

/// True if the entity type is expected to carry renderable geometry, used
/// to set the `HAS_GEOMETRY` flag independent of whether `Representation`
/// actually resolves (that check is the authoritative one; this is the
/// cheap pre-filter the columnar store builder uses, mirroring the
/// teacher's `IfcSchema::has_geometry`).
pub fn has_geometry_by_name(ifc_type: &IfcType) -> bool {
    if ifc_type.as_str().contains("REINFORC") {
        return true;
    }
    matches!(
        ifc_type,
        IfcType::IfcWall
            | IfcType::IfcWallStandardCase
            | IfcType::IfcSlab
            | IfcType::IfcBeam
            | IfcType::IfcColumn
            | IfcType::IfcRoof
            | IfcType::IfcStair
            | IfcType::IfcRamp
            | IfcType::IfcRailing
            | IfcType::IfcPlate
            | IfcType::IfcMember
            | IfcType::IfcFooting
            | IfcType::IfcPile
            | IfcType::IfcCovering
            | IfcType::IfcCurtainWall
            | IfcType::IfcDoor
            | IfcType::IfcWindow
            | IfcType::IfcOpeningElement
            | IfcType::IfcChimney
            | IfcType::IfcShadingDevice
            | IfcType::IfcBuildingElementProxy
            | IfcType::IfcBuildingElementPart
            | IfcType::IfcFurnishingElement
            | IfcType::IfcFurniture
            | IfcType::IfcDuctSegment
            | IfcType::IfcPipeSegment
            | IfcType::IfcCableSegment
            | IfcType::IfcAnnotation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_round_trips_as_str() {
        for name in ALL_TYPE_NAMES {
            let t = IfcType::from_str(name).unwrap();
            assert_eq!(t.as_str(), *name);
        }
    }

    #[test]
    fn unknown_type_hashes() {
        let t = IfcType::from_str("IFCSOMETHINGNEW").unwrap();
        assert!(matches!(t, IfcType::Unknown(_)));
    }

    #[test]
    fn type_ids_are_dense_and_unique() {
        let mut ids: Vec<u16> = ALL_TYPE_NAMES
            .iter()
            .map(|n| IfcType::from_str(n).unwrap().type_id())
            .collect();
        ids.sort_unstable();
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(*id as usize, i);
        }
    }

    #[test]
    fn wall_inherits_root_attributes() {
        let all = IfcType::IfcWall.all_attributes();
        assert!(all.iter().any(|a| a.name == "GlobalId"));
        assert!(all.iter().any(|a| a.name == "ObjectPlacement"));
        assert!(all.iter().any(|a| a.name == "PredefinedType"));
    }

    #[test]
    fn extruded_area_solid_chain() {
        let chain = IfcType::IfcExtrudedAreaSolid.inheritance_chain();
        assert_eq!(chain.first().unwrap().as_str(), "IFCSOLIDMODEL");
        assert_eq!(chain.last().unwrap().as_str(), "IFCEXTRUDEDAREASOLID");
    }

    #[test]
    fn has_geometry_flags_building_elements() {
        assert!(has_geometry_by_name(&IfcType::IfcWall));
        assert!(!has_geometry_by_name(&IfcType::IfcProject));
    }
}
