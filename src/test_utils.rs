//! テスト用ユーティリティ関数
//!
//! 複数のテストモジュールで使用される共通のヘルパー関数を提供します。
#![cfg(test)]

use crate::db::LinguistDatabaseImpl;
use crate::input::catalog_file::CatalogFile;

/// lupdate が出力する形式そのままの小さなカタログ
///
/// finished / unfinished / vanished / numerus / location を一通り含みます。
pub(crate) const SAMPLE_CATALOG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="pt_BR" sourcelanguage="en">
<context>
    <name>MainWindow</name>
    <message>
        <source>&amp;File</source>
        <translation>&amp;Arquivo</translation>
    </message>
    <message>
        <location filename="../mainwindow.cpp" line="120"/>
        <location line="+4"/>
        <source>Open</source>
        <comment>menu entry</comment>
        <translatorcomment>check wording</translatorcomment>
        <translation type="unfinished">Abrir</translation>
    </message>
    <message>
        <source>Save &amp;As</source>
        <translation type="vanished">Salvar &amp;Como</translation>
    </message>
</context>
<context>
    <name>options::PageAudio</name>
    <message>
        <source>Input device</source>
        <translation>Dispositivo de entrada</translation>
    </message>
    <message numerus="yes">
        <source>%n device(s)</source>
        <translation type="unfinished">
            <numerusform>%n dispositivo</numerusform>
            <numerusform>%n dispositivos</numerusform>
        </translation>
    </message>
</context>
</TS>
"#;

/// テスト用の `CatalogFile` を作成する
///
/// # Arguments
/// * `db` - Salsa データベース
/// * `file_path` - カタログファイルのパス
/// * `text` - ファイル内容
pub(crate) fn create_catalog_file(
    db: &LinguistDatabaseImpl,
    file_path: &str,
    text: &str,
) -> CatalogFile {
    CatalogFile::new(db, file_path.to_string(), text.to_string())
}
