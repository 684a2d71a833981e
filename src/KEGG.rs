/// Access to the KEGG REST service (https://rest.kegg.jp): finds every reaction linked
/// to a compound and downloads the reaction entries as flat text records.
pub mod kegg_api;
/// Parsing of KEGG reaction flat files and of reaction equations
/// (`C00031 + C00002 <=> C00092 + C00008`) into substrates and products.
pub mod record_parser;
