//! Compiled-in element and nuclide reference data (NIST atomic weights).
//!
//! Element masses follow the convention of the upstream data set: the mass
//! of the most abundant isotope for stable elements, and of the
//! longest-lived isotope for unstable ones. Nuclide entries cover every
//! stable isotope for Z <= 36 plus the common reference nuclides of heavier
//! elements; the default nuclide of every element is always present.

use phf::{Map, phf_map};

/// Static per-element record: identity, default nuclide, and table position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementData {
    /// Atomic number, number of protons.
    pub z: u16,
    /// Element symbol, "Fe" capitalization.
    pub symbol: &'static str,
    /// Element name, "Iron" capitalization.
    pub name: &'static str,
    /// Mass [u] of the default (most abundant or longest-lived) nuclide.
    pub mass: f64,
    /// Mass number of the default nuclide.
    pub a: u16,
    /// Periodic-table period.
    pub period: u8,
    /// Periodic-table group (f-block elements listed under group 3).
    pub group: u8,
}

const fn el(
    z: u16,
    symbol: &'static str,
    name: &'static str,
    mass: f64,
    a: u16,
    period: u8,
    group: u8,
) -> ElementData {
    ElementData {
        z,
        symbol,
        name,
        mass,
        a,
        period,
        group,
    }
}

/// Element symbols indexed by atomic number (index 0 unused).
pub static SYMBOLS: [&str; 119] = [
    "", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm",
    "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg",
    "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Symbol-keyed element records.
pub static ELEMENTS: Map<&'static str, ElementData> = phf_map! {
    "H" => el(1, "H", "Hydrogen", 1.00782503207, 1, 1, 1),
    "He" => el(2, "He", "Helium", 4.002603254, 4, 1, 18),
    "Li" => el(3, "Li", "Lithium", 7.01600455, 7, 2, 1),
    "Be" => el(4, "Be", "Beryllium", 9.0121822, 9, 2, 2),
    "B" => el(5, "B", "Boron", 11.0093054, 11, 2, 13),
    "C" => el(6, "C", "Carbon", 12.0, 12, 2, 14),
    "N" => el(7, "N", "Nitrogen", 14.0030740048, 14, 2, 15),
    "O" => el(8, "O", "Oxygen", 15.99491461956, 16, 2, 16),
    "F" => el(9, "F", "Fluorine", 18.99840322, 19, 2, 17),
    "Ne" => el(10, "Ne", "Neon", 19.9924401754, 20, 2, 18),
    "Na" => el(11, "Na", "Sodium", 22.9897692809, 23, 3, 1),
    "Mg" => el(12, "Mg", "Magnesium", 23.9850417, 24, 3, 2),
    "Al" => el(13, "Al", "Aluminum", 26.98153863, 27, 3, 13),
    "Si" => el(14, "Si", "Silicon", 27.9769265325, 28, 3, 14),
    "P" => el(15, "P", "Phosphorus", 30.97376163, 31, 3, 15),
    "S" => el(16, "S", "Sulfur", 31.97207100, 32, 3, 16),
    "Cl" => el(17, "Cl", "Chlorine", 34.96885268, 35, 3, 17),
    "Ar" => el(18, "Ar", "Argon", 39.9623831225, 40, 3, 18),
    "K" => el(19, "K", "Potassium", 38.96370668, 39, 4, 1),
    "Ca" => el(20, "Ca", "Calcium", 39.96259098, 40, 4, 2),
    "Sc" => el(21, "Sc", "Scandium", 44.9559119, 45, 4, 3),
    "Ti" => el(22, "Ti", "Titanium", 47.9479463, 48, 4, 4),
    "V" => el(23, "V", "Vanadium", 50.9439595, 51, 4, 5),
    "Cr" => el(24, "Cr", "Chromium", 51.9405075, 52, 4, 6),
    "Mn" => el(25, "Mn", "Manganese", 54.9380451, 55, 4, 7),
    "Fe" => el(26, "Fe", "Iron", 55.9349375, 56, 4, 8),
    "Co" => el(27, "Co", "Cobalt", 58.933195048, 59, 4, 9),
    "Ni" => el(28, "Ni", "Nickel", 57.9353429, 58, 4, 10),
    "Cu" => el(29, "Cu", "Copper", 62.9295975, 63, 4, 11),
    "Zn" => el(30, "Zn", "Zinc", 63.9291422, 64, 4, 12),
    "Ga" => el(31, "Ga", "Gallium", 68.9255736, 69, 4, 13),
    "Ge" => el(32, "Ge", "Germanium", 73.9211778, 74, 4, 14),
    "As" => el(33, "As", "Arsenic", 74.9215965, 75, 4, 15),
    "Se" => el(34, "Se", "Selenium", 79.9165213, 80, 4, 16),
    "Br" => el(35, "Br", "Bromine", 78.9183371, 79, 4, 17),
    "Kr" => el(36, "Kr", "Krypton", 83.911507, 84, 4, 18),
    "Rb" => el(37, "Rb", "Rubidium", 84.911789738, 85, 5, 1),
    "Sr" => el(38, "Sr", "Strontium", 87.9056121, 88, 5, 2),
    "Y" => el(39, "Y", "Yttrium", 88.9058483, 89, 5, 3),
    "Zr" => el(40, "Zr", "Zirconium", 89.9047044, 90, 5, 4),
    "Nb" => el(41, "Nb", "Niobium", 92.9063781, 93, 5, 5),
    "Mo" => el(42, "Mo", "Molybdenum", 97.9054082, 98, 5, 6),
    "Tc" => el(43, "Tc", "Technetium", 97.907216, 98, 5, 7),
    "Ru" => el(44, "Ru", "Ruthenium", 101.9043493, 102, 5, 8),
    "Rh" => el(45, "Rh", "Rhodium", 102.905504, 103, 5, 9),
    "Pd" => el(46, "Pd", "Palladium", 105.903486, 106, 5, 10),
    "Ag" => el(47, "Ag", "Silver", 106.905097, 107, 5, 11),
    "Cd" => el(48, "Cd", "Cadmium", 113.9033585, 114, 5, 12),
    "In" => el(49, "In", "Indium", 114.903878, 115, 5, 13),
    "Sn" => el(50, "Sn", "Tin", 119.9021947, 120, 5, 14),
    "Sb" => el(51, "Sb", "Antimony", 120.9038157, 121, 5, 15),
    "Te" => el(52, "Te", "Tellurium", 129.9062244, 130, 5, 16),
    "I" => el(53, "I", "Iodine", 126.904473, 127, 5, 17),
    "Xe" => el(54, "Xe", "Xenon", 131.9041535, 132, 5, 18),
    "Cs" => el(55, "Cs", "Cesium", 132.905451933, 133, 6, 1),
    "Ba" => el(56, "Ba", "Barium", 137.9052472, 138, 6, 2),
    "La" => el(57, "La", "Lanthanum", 138.9063533, 139, 6, 3),
    "Ce" => el(58, "Ce", "Cerium", 139.9054387, 140, 6, 3),
    "Pr" => el(59, "Pr", "Praseodymium", 140.9076528, 141, 6, 3),
    "Nd" => el(60, "Nd", "Neodymium", 141.9077233, 142, 6, 3),
    "Pm" => el(61, "Pm", "Promethium", 144.912749, 145, 6, 3),
    "Sm" => el(62, "Sm", "Samarium", 151.9197324, 152, 6, 3),
    "Eu" => el(63, "Eu", "Europium", 152.9212303, 153, 6, 3),
    "Gd" => el(64, "Gd", "Gadolinium", 157.9241039, 158, 6, 3),
    "Tb" => el(65, "Tb", "Terbium", 158.9253468, 159, 6, 3),
    "Dy" => el(66, "Dy", "Dysprosium", 163.9291748, 164, 6, 3),
    "Ho" => el(67, "Ho", "Holmium", 164.9303221, 165, 6, 3),
    "Er" => el(68, "Er", "Erbium", 165.9302931, 166, 6, 3),
    "Tm" => el(69, "Tm", "Thulium", 168.9342133, 169, 6, 3),
    "Yb" => el(70, "Yb", "Ytterbium", 173.9388621, 174, 6, 3),
    "Lu" => el(71, "Lu", "Lutetium", 174.9407718, 175, 6, 3),
    "Hf" => el(72, "Hf", "Hafnium", 179.9465500, 180, 6, 4),
    "Ta" => el(73, "Ta", "Tantalum", 180.9479958, 181, 6, 5),
    "W" => el(74, "W", "Tungsten", 183.9509312, 184, 6, 6),
    "Re" => el(75, "Re", "Rhenium", 186.9557531, 187, 6, 7),
    "Os" => el(76, "Os", "Osmium", 191.9614807, 192, 6, 8),
    "Ir" => el(77, "Ir", "Iridium", 192.9629264, 193, 6, 9),
    "Pt" => el(78, "Pt", "Platinum", 194.9647911, 195, 6, 10),
    "Au" => el(79, "Au", "Gold", 196.9665687, 197, 6, 11),
    "Hg" => el(80, "Hg", "Mercury", 201.970643, 202, 6, 12),
    "Tl" => el(81, "Tl", "Thallium", 204.9744275, 205, 6, 13),
    "Pb" => el(82, "Pb", "Lead", 207.9766521, 208, 6, 14),
    "Bi" => el(83, "Bi", "Bismuth", 208.9803987, 209, 6, 15),
    "Po" => el(84, "Po", "Polonium", 208.9824304, 209, 6, 16),
    "At" => el(85, "At", "Astatine", 209.987148, 210, 6, 17),
    "Rn" => el(86, "Rn", "Radon", 222.0175777, 222, 6, 18),
    "Fr" => el(87, "Fr", "Francium", 223.0197359, 223, 7, 1),
    "Ra" => el(88, "Ra", "Radium", 226.0254098, 226, 7, 2),
    "Ac" => el(89, "Ac", "Actinium", 227.0027521, 227, 7, 3),
    "Th" => el(90, "Th", "Thorium", 232.0380553, 232, 7, 3),
    "Pa" => el(91, "Pa", "Protactinium", 231.0358840, 231, 7, 3),
    "U" => el(92, "U", "Uranium", 238.0507882, 238, 7, 3),
    "Np" => el(93, "Np", "Neptunium", 237.0481734, 237, 7, 3),
    "Pu" => el(94, "Pu", "Plutonium", 244.064204, 244, 7, 3),
    "Am" => el(95, "Am", "Americium", 243.0613811, 243, 7, 3),
    "Cm" => el(96, "Cm", "Curium", 247.070354, 247, 7, 3),
    "Bk" => el(97, "Bk", "Berkelium", 247.070307, 247, 7, 3),
    "Cf" => el(98, "Cf", "Californium", 251.079587, 251, 7, 3),
    "Es" => el(99, "Es", "Einsteinium", 252.082980, 252, 7, 3),
    "Fm" => el(100, "Fm", "Fermium", 257.095105, 257, 7, 3),
    "Md" => el(101, "Md", "Mendelevium", 258.098431, 258, 7, 3),
    "No" => el(102, "No", "Nobelium", 259.10103, 259, 7, 3),
    "Lr" => el(103, "Lr", "Lawrencium", 262.10963, 262, 7, 3),
    "Rf" => el(104, "Rf", "Rutherfordium", 267.12179, 267, 7, 4),
    "Db" => el(105, "Db", "Dubnium", 268.12567, 268, 7, 5),
    "Sg" => el(106, "Sg", "Seaborgium", 271.13393, 271, 7, 6),
    "Bh" => el(107, "Bh", "Bohrium", 272.13826, 272, 7, 7),
    "Hs" => el(108, "Hs", "Hassium", 270.13429, 270, 7, 8),
    "Mt" => el(109, "Mt", "Meitnerium", 276.15159, 276, 7, 9),
    "Ds" => el(110, "Ds", "Darmstadtium", 281.16451, 281, 7, 10),
    "Rg" => el(111, "Rg", "Roentgenium", 280.16514, 280, 7, 11),
    "Cn" => el(112, "Cn", "Copernicium", 285.17712, 285, 7, 12),
    "Nh" => el(113, "Nh", "Nihonium", 284.17873, 284, 7, 13),
    "Fl" => el(114, "Fl", "Flerovium", 289.18728, 289, 7, 14),
    "Mc" => el(115, "Mc", "Moscovium", 288.19274, 288, 7, 15),
    "Lv" => el(116, "Lv", "Livermorium", 293.20449, 293, 7, 16),
    "Ts" => el(117, "Ts", "Tennessine", 292.20746, 292, 7, 17),
    "Og" => el(118, "Og", "Oganesson", 294.21392, 294, 7, 18),
};

/// Lowercased element-name aliases.
pub static NAMES: Map<&'static str, &'static str> = phf_map! {
    "hydrogen" => "H", "helium" => "He", "lithium" => "Li", "beryllium" => "Be",
    "boron" => "B", "carbon" => "C", "nitrogen" => "N", "oxygen" => "O",
    "fluorine" => "F", "neon" => "Ne", "sodium" => "Na", "magnesium" => "Mg",
    "aluminum" => "Al", "aluminium" => "Al", "silicon" => "Si", "phosphorus" => "P",
    "sulfur" => "S", "chlorine" => "Cl", "argon" => "Ar", "potassium" => "K",
    "calcium" => "Ca", "scandium" => "Sc", "titanium" => "Ti", "vanadium" => "V",
    "chromium" => "Cr", "manganese" => "Mn", "iron" => "Fe", "cobalt" => "Co",
    "nickel" => "Ni", "copper" => "Cu", "zinc" => "Zn", "gallium" => "Ga",
    "germanium" => "Ge", "arsenic" => "As", "selenium" => "Se", "bromine" => "Br",
    "krypton" => "Kr", "rubidium" => "Rb", "strontium" => "Sr", "yttrium" => "Y",
    "zirconium" => "Zr", "niobium" => "Nb", "molybdenum" => "Mo", "technetium" => "Tc",
    "ruthenium" => "Ru", "rhodium" => "Rh", "palladium" => "Pd", "silver" => "Ag",
    "cadmium" => "Cd", "indium" => "In", "tin" => "Sn", "antimony" => "Sb",
    "tellurium" => "Te", "iodine" => "I", "xenon" => "Xe", "cesium" => "Cs",
    "caesium" => "Cs", "barium" => "Ba", "lanthanum" => "La", "cerium" => "Ce",
    "praseodymium" => "Pr", "neodymium" => "Nd", "promethium" => "Pm",
    "samarium" => "Sm", "europium" => "Eu", "gadolinium" => "Gd", "terbium" => "Tb",
    "dysprosium" => "Dy", "holmium" => "Ho", "erbium" => "Er", "thulium" => "Tm",
    "ytterbium" => "Yb", "lutetium" => "Lu", "hafnium" => "Hf", "tantalum" => "Ta",
    "tungsten" => "W", "rhenium" => "Re", "osmium" => "Os", "iridium" => "Ir",
    "platinum" => "Pt", "gold" => "Au", "mercury" => "Hg", "thallium" => "Tl",
    "lead" => "Pb", "bismuth" => "Bi", "polonium" => "Po", "astatine" => "At",
    "radon" => "Rn", "francium" => "Fr", "radium" => "Ra", "actinium" => "Ac",
    "thorium" => "Th", "protactinium" => "Pa", "uranium" => "U", "neptunium" => "Np",
    "plutonium" => "Pu", "americium" => "Am", "curium" => "Cm", "berkelium" => "Bk",
    "californium" => "Cf", "einsteinium" => "Es", "fermium" => "Fm",
    "mendelevium" => "Md", "nobelium" => "No", "lawrencium" => "Lr",
    "rutherfordium" => "Rf", "dubnium" => "Db", "seaborgium" => "Sg",
    "bohrium" => "Bh", "hassium" => "Hs", "meitnerium" => "Mt",
    "darmstadtium" => "Ds", "roentgenium" => "Rg", "copernicium" => "Cn",
    "nihonium" => "Nh", "flerovium" => "Fl", "moscovium" => "Mc",
    "livermorium" => "Lv", "tennessine" => "Ts", "oganesson" => "Og",
};

/// Nuclide-keyed masses [u], `"Sym<A>"` form. The default nuclide of every
/// element is present; Z <= 36 carry their complete stable sets.
pub static ISOTOPES: Map<&'static str, f64> = phf_map! {
    "H1" => 1.00782503207, "H2" => 2.0141017778, "H3" => 3.0160492777,
    "He3" => 3.0160293191, "He4" => 4.002603254,
    "Li6" => 6.015122795, "Li7" => 7.01600455,
    "Be9" => 9.0121822,
    "B10" => 10.0129370, "B11" => 11.0093054,
    "C12" => 12.0, "C13" => 13.0033548378, "C14" => 14.003241989,
    "N14" => 14.0030740048, "N15" => 15.0001088982,
    "O16" => 15.99491461956, "O17" => 16.99913170, "O18" => 17.9991610,
    "F19" => 18.99840322,
    "Ne20" => 19.9924401754, "Ne21" => 20.99384668, "Ne22" => 21.991385114,
    "Na23" => 22.9897692809,
    "Mg24" => 23.9850417, "Mg25" => 24.98583692, "Mg26" => 25.982592929,
    "Al27" => 26.98153863,
    "Si28" => 27.9769265325, "Si29" => 28.976494700, "Si30" => 29.97377017,
    "P31" => 30.97376163,
    "S32" => 31.97207100, "S33" => 32.97145876, "S34" => 33.96786690,
    "S36" => 35.96708076,
    "Cl35" => 34.96885268, "Cl37" => 36.96590259,
    "Ar36" => 35.967545106, "Ar38" => 37.9627324, "Ar40" => 39.9623831225,
    "K39" => 38.96370668, "K40" => 39.96399848, "K41" => 40.96182576,
    "Ca40" => 39.96259098, "Ca42" => 41.95861801, "Ca43" => 42.9587666,
    "Ca44" => 43.9554818, "Ca46" => 45.9536926, "Ca48" => 47.952534,
    "Sc45" => 44.9559119,
    "Ti46" => 45.9526316, "Ti47" => 46.9517631, "Ti48" => 47.9479463,
    "Ti49" => 48.9478700, "Ti50" => 49.9447912,
    "V50" => 49.9471585, "V51" => 50.9439595,
    "Cr50" => 49.9460442, "Cr52" => 51.9405075, "Cr53" => 52.9406494,
    "Cr54" => 53.9388804,
    "Mn55" => 54.9380451,
    "Fe54" => 53.9396105, "Fe56" => 55.9349375, "Fe57" => 56.9353940,
    "Fe58" => 57.9332756,
    "Co59" => 58.933195048, "Co60" => 59.933817059,
    "Ni58" => 57.9353429, "Ni60" => 59.9307864, "Ni61" => 60.9310560,
    "Ni62" => 61.9283451, "Ni64" => 63.9279660,
    "Cu63" => 62.9295975, "Cu65" => 64.9277895,
    "Zn64" => 63.9291422, "Zn66" => 65.9260334, "Zn67" => 66.9271273,
    "Zn68" => 67.9248442, "Zn70" => 69.9253193,
    "Ga69" => 68.9255736, "Ga71" => 70.9247013,
    "Ge70" => 69.9242474, "Ge72" => 71.9220758, "Ge73" => 72.9234589,
    "Ge74" => 73.9211778, "Ge76" => 75.9214026,
    "As75" => 74.9215965,
    "Se74" => 73.9224764, "Se76" => 75.9192136, "Se77" => 76.9199140,
    "Se78" => 77.9173091, "Se80" => 79.9165213, "Se82" => 81.9166994,
    "Br79" => 78.9183371, "Br81" => 80.9162906,
    "Kr78" => 77.9203648, "Kr80" => 79.9163790, "Kr82" => 81.9134836,
    "Kr83" => 82.914136, "Kr84" => 83.911507, "Kr86" => 85.91061073,
    "Rb85" => 84.911789738, "Rb87" => 86.909180527,
    "Sr84" => 83.913425, "Sr86" => 85.9092602, "Sr87" => 86.9088771,
    "Sr88" => 87.9056121,
    "Y89" => 88.9058483,
    "Zr90" => 89.9047044,
    "Nb93" => 92.9063781,
    "Mo98" => 97.9054082,
    "Tc98" => 97.907216,
    "Ru102" => 101.9043493,
    "Rh103" => 102.905504,
    "Pd106" => 105.903486,
    "Ag107" => 106.905097, "Ag109" => 108.904752,
    "Cd114" => 113.9033585,
    "In115" => 114.903878,
    "Sn118" => 117.901603, "Sn120" => 119.9021947,
    "Sb121" => 120.9038157,
    "Te130" => 129.9062244,
    "I127" => 126.904473, "I129" => 128.904988,
    "Xe129" => 128.9047794, "Xe132" => 131.9041535,
    "Cs133" => 132.905451933,
    "Ba138" => 137.9052472,
    "La139" => 138.9063533,
    "Ce140" => 139.9054387,
    "Pr141" => 140.9076528,
    "Nd142" => 141.9077233,
    "Pm145" => 144.912749,
    "Sm152" => 151.9197324,
    "Eu153" => 152.9212303,
    "Gd158" => 157.9241039,
    "Tb159" => 158.9253468,
    "Dy164" => 163.9291748,
    "Ho165" => 164.9303221,
    "Er166" => 165.9302931,
    "Tm169" => 168.9342133,
    "Yb174" => 173.9388621,
    "Lu175" => 174.9407718,
    "Hf180" => 179.9465500,
    "Ta181" => 180.9479958,
    "W184" => 183.9509312,
    "Re187" => 186.9557531,
    "Os192" => 191.9614807,
    "Ir193" => 192.9629264,
    "Pt195" => 194.9647911,
    "Au197" => 196.9665687,
    "Hg199" => 198.9682799, "Hg202" => 201.970643,
    "Tl205" => 204.9744275,
    "Pb206" => 205.9744653, "Pb207" => 206.9758969, "Pb208" => 207.9766521,
    "Bi209" => 208.9803987,
    "Po209" => 208.9824304,
    "At210" => 209.987148,
    "Rn222" => 222.0175777,
    "Fr223" => 223.0197359,
    "Ra226" => 226.0254098,
    "Ac227" => 227.0027521,
    "Th232" => 232.0380553,
    "Pa231" => 231.0358840,
    "U233" => 233.0396352, "U235" => 235.0439299, "U238" => 238.0507882,
    "Np237" => 237.0481734,
    "Pu239" => 239.0521634, "Pu244" => 244.064204,
    "Am243" => 243.0613811,
    "Cm247" => 247.070354,
    "Bk247" => 247.070307,
    "Cf251" => 251.079587,
    "Es252" => 252.082980,
    "Fm257" => 257.095105,
    "Md258" => 258.098431,
    "No259" => 259.10103,
    "Lr262" => 262.10963,
    "Rf267" => 267.12179,
    "Db268" => 268.12567,
    "Sg271" => 271.13393,
    "Bh272" => 272.13826,
    "Hs270" => 270.13429,
    "Mt276" => 276.15159,
    "Ds281" => 281.16451,
    "Rg280" => 280.16514,
    "Cn285" => 285.17712,
    "Nh284" => 284.17873,
    "Fl289" => 289.18728,
    "Mc288" => 288.19274,
    "Lv293" => 293.20449,
    "Ts292" => 292.20746,
    "Og294" => 294.21392,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_array_agrees_with_element_map() {
        for (symbol, data) in ELEMENTS.entries() {
            assert_eq!(SYMBOLS[data.z as usize], *symbol);
        }
        assert_eq!(ELEMENTS.len(), 118);
    }

    #[test]
    fn every_element_default_nuclide_is_in_isotope_map() {
        for (_, data) in ELEMENTS.entries() {
            let key = format!("{}{}", data.symbol, data.a);
            let mass = ISOTOPES
                .get(key.as_str())
                .unwrap_or_else(|| panic!("missing default nuclide {key}"));
            assert!(
                (mass - data.mass).abs() < 1e-9,
                "default nuclide mass mismatch for {key}"
            );
        }
    }

    #[test]
    fn every_name_alias_resolves_to_a_known_symbol() {
        for (_, symbol) in NAMES.entries() {
            assert!(ELEMENTS.contains_key(symbol));
        }
    }
}
