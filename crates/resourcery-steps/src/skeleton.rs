use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use resourcery_core::Result;
use resourcery_core::naming::{plural, table_name};

use crate::console::{Console, ConsoleCommand, ConsoleOutput};
use crate::layout::ProjectLayout;

/// Console that writes the stock Laravel/Filament skeletons itself and treats
/// `migrate` and `db:seed` as successful no-ops.
///
/// Existing files are left untouched, matching the scaffold generators.
#[derive(Debug, Default)]
pub struct SkeletonConsole {
    failing: HashSet<&'static str>,
    silent: HashSet<&'static str>,
    history: Mutex<Vec<ConsoleCommand>>,
}

impl SkeletonConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every command named `name` (e.g. `migrate`) exit with status 1.
    pub fn failing(mut self, name: &'static str) -> Self {
        self.failing.insert(name);
        self
    }

    /// Make every command named `name` succeed without writing anything.
    pub fn silent(mut self, name: &'static str) -> Self {
        self.silent.insert(name);
        self
    }

    /// Commands run so far, in order.
    pub fn history(&self) -> Vec<ConsoleCommand> {
        match self.history.lock() {
            Ok(history) => history.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, command: &ConsoleCommand) {
        match self.history.lock() {
            Ok(mut history) => history.push(command.clone()),
            Err(poisoned) => poisoned.into_inner().push(command.clone()),
        }
    }
}

#[async_trait]
impl Console for SkeletonConsole {
    async fn run(&self, layout: &ProjectLayout, command: &ConsoleCommand) -> Result<ConsoleOutput> {
        self.record(command);
        let name = command.name();
        if self.failing.contains(name) {
            return Ok(ConsoleOutput {
                status: 1,
                output: format!("{name} failed"),
            });
        }
        if self.silent.contains(name) {
            return Ok(ConsoleOutput::ok());
        }

        match command {
            ConsoleCommand::MakeModel {
                name,
                with_migration,
            } => {
                write_new(&layout.model_path(name), &render(MODEL, name))?;
                if *with_migration {
                    let table = table_name(name);
                    let stamp = Utc::now().format("%Y_%m_%d_%H%M%S");
                    let path = layout
                        .migrations_dir()
                        .join(format!("{stamp}_create_{table}_table.php"));
                    write_new(&path, &render(MIGRATION, name))?;
                }
            }
            ConsoleCommand::MakeResource {
                name,
                soft_deletes,
                view,
            } => {
                let resource = resource_skeleton(name, *soft_deletes, *view);
                write_new(&layout.resource_path(name), &resource)?;
                write_new(
                    &layout.list_page_path(name, &plural(name)),
                    &render(LIST_PAGE, name),
                )?;
                write_new(&layout.create_page_path(name), &render(CREATE_PAGE, name))?;
                let edit_actions = if *view {
                    "            Actions\\ViewAction::make(),\n            Actions\\DeleteAction::make(),"
                } else {
                    "            Actions\\DeleteAction::make(),"
                };
                write_new(
                    &layout.edit_page_path(name),
                    &render(EDIT_PAGE, name).replace("__HEADER_ACTIONS__", edit_actions),
                )?;
                if *view {
                    write_new(&layout.view_page_path(name), &render(VIEW_PAGE, name))?;
                }
            }
            ConsoleCommand::MakePolicy { name, model } => {
                let path = layout.policies_dir().join(format!("{name}.php"));
                write_new(&path, &render(POLICY, model))?;
            }
            ConsoleCommand::MakeFactory { name, model } => {
                let path = layout
                    .root()
                    .join("database")
                    .join("factories")
                    .join(format!("{name}.php"));
                write_new(&path, &render(FACTORY, model))?;
            }
            ConsoleCommand::MakeSeeder { name } => {
                let entity = name.strip_suffix("Seeder").unwrap_or(name);
                write_new(&layout.seeder_path(entity), &render(SEEDER, entity))?;
            }
            ConsoleCommand::Migrate => {
                return Ok(ConsoleOutput {
                    status: 0,
                    output: "INFO  Nothing to migrate.".to_string(),
                });
            }
            ConsoleCommand::Seed { class } => {
                return Ok(ConsoleOutput {
                    status: 0,
                    output: format!("INFO  Seeding database. {class}"),
                });
            }
        }

        Ok(ConsoleOutput::ok())
    }
}

fn write_new(path: &Path, contents: &str) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

fn render(template: &str, entity: &str) -> String {
    template
        .replace("__ENTITY__", entity)
        .replace("__PLURAL__", &plural(entity))
        .replace("__TABLE__", &table_name(entity))
}

fn resource_skeleton(entity: &str, soft_deletes: bool, view: bool) -> String {
    let mut row_actions = String::new();
    if view {
        row_actions.push_str("                Tables\\Actions\\ViewAction::make(),\n");
    }
    row_actions.push_str("                Tables\\Actions\\EditAction::make(),");

    let (filters, bulk_actions, query) = if soft_deletes {
        (
            "                Tables\\Filters\\TrashedFilter::make(),",
            "                    Tables\\Actions\\DeleteBulkAction::make(),\n                    Tables\\Actions\\ForceDeleteBulkAction::make(),\n                    Tables\\Actions\\RestoreBulkAction::make(),",
            SOFT_DELETE_QUERY,
        )
    } else {
        (
            "                //",
            "                    Tables\\Actions\\DeleteBulkAction::make(),",
            "",
        )
    };

    let mut pages = String::from(
        "            'index' => Pages\\List__PLURAL__::route('/'),\n            'create' => Pages\\Create__ENTITY__::route('/create'),\n",
    );
    if view {
        pages.push_str("            'view' => Pages\\View__ENTITY__::route('/{record}'),\n");
    }
    pages.push_str("            'edit' => Pages\\Edit__ENTITY__::route('/{record}/edit'),");

    render(
        &RESOURCE
            .replace("__ROW_ACTIONS__", &row_actions)
            .replace("__FILTERS__", filters)
            .replace("__BULK_ACTIONS__", bulk_actions)
            .replace("__PAGES__", &pages)
            .replace("__QUERY__", query),
        entity,
    )
}

const MODEL: &str = r#"<?php

namespace App\Models;

use Illuminate\Database\Eloquent\Factories\HasFactory;
use Illuminate\Database\Eloquent\Model;

class __ENTITY__ extends Model
{
    use HasFactory;
}
"#;

const MIGRATION: &str = r#"<?php

use Illuminate\Database\Migrations\Migration;
use Illuminate\Database\Schema\Blueprint;
use Illuminate\Support\Facades\Schema;

return new class extends Migration
{
    /**
     * Run the migrations.
     */
    public function up(): void
    {
        Schema::create('__TABLE__', function (Blueprint $table) {
            $table->id();
            $table->timestamps();
        });
    }

    /**
     * Reverse the migrations.
     */
    public function down(): void
    {
        Schema::dropIfExists('__TABLE__');
    }
};
"#;

const RESOURCE: &str = r#"<?php

namespace App\Filament\Resources;

use App\Filament\Resources\__ENTITY__Resource\Pages;
use App\Filament\Resources\__ENTITY__Resource\RelationManagers;
use App\Models\__ENTITY__;
use Filament\Forms;
use Filament\Forms\Form;
use Filament\Resources\Resource;
use Filament\Tables;
use Filament\Tables\Table;
use Illuminate\Database\Eloquent\Builder;
use Illuminate\Database\Eloquent\SoftDeletingScope;

class __ENTITY__Resource extends Resource
{
    protected static ?string $model = __ENTITY__::class;

    protected static ?string $navigationIcon = 'heroicon-o-rectangle-stack';

    public static function form(Form $form): Form
    {
        return $form
            ->schema([
                //
            ]);
    }

    public static function table(Table $table): Table
    {
        return $table
            ->columns([
                //
            ])
            ->filters([
__FILTERS__
            ])
            ->actions([
__ROW_ACTIONS__
            ])
            ->bulkActions([
                Tables\Actions\BulkActionGroup::make([
__BULK_ACTIONS__
                ]),
            ]);
    }

    public static function getRelations(): array
    {
        return [
            //
        ];
    }

    public static function getPages(): array
    {
        return [
__PAGES__
        ];
    }__QUERY__
}
"#;

const SOFT_DELETE_QUERY: &str = r#"

    public static function getEloquentQuery(): Builder
    {
        return parent::getEloquentQuery()
            ->withoutGlobalScopes([
                SoftDeletingScope::class,
            ]);
    }"#;

const LIST_PAGE: &str = r#"<?php

namespace App\Filament\Resources\__ENTITY__Resource\Pages;

use App\Filament\Resources\__ENTITY__Resource;
use Filament\Actions;
use Filament\Resources\Pages\ListRecords;

class List__PLURAL__ extends ListRecords
{
    protected static string $resource = __ENTITY__Resource::class;

    protected function getHeaderActions(): array
    {
        return [
            Actions\CreateAction::make(),
        ];
    }
}
"#;

const CREATE_PAGE: &str = r#"<?php

namespace App\Filament\Resources\__ENTITY__Resource\Pages;

use App\Filament\Resources\__ENTITY__Resource;
use Filament\Actions;
use Filament\Resources\Pages\CreateRecord;

class Create__ENTITY__ extends CreateRecord
{
    protected static string $resource = __ENTITY__Resource::class;
}
"#;

const EDIT_PAGE: &str = r#"<?php

namespace App\Filament\Resources\__ENTITY__Resource\Pages;

use App\Filament\Resources\__ENTITY__Resource;
use Filament\Actions;
use Filament\Resources\Pages\EditRecord;

class Edit__ENTITY__ extends EditRecord
{
    protected static string $resource = __ENTITY__Resource::class;

    protected function getHeaderActions(): array
    {
        return [
__HEADER_ACTIONS__
        ];
    }
}
"#;

const VIEW_PAGE: &str = r#"<?php

namespace App\Filament\Resources\__ENTITY__Resource\Pages;

use App\Filament\Resources\__ENTITY__Resource;
use Filament\Actions;
use Filament\Resources\Pages\ViewRecord;

class View__ENTITY__ extends ViewRecord
{
    protected static string $resource = __ENTITY__Resource::class;

    protected function getHeaderActions(): array
    {
        return [
            Actions\EditAction::make(),
        ];
    }
}
"#;

const POLICY: &str = r#"<?php

namespace App\Policies;

use App\Models\__ENTITY__;
use App\Models\User;
use Illuminate\Auth\Access\Response;

class __ENTITY__Policy
{
    /**
     * Determine whether the user can view any models.
     */
    public function viewAny(User $user): bool
    {
        //
    }

    /**
     * Determine whether the user can view the model.
     */
    public function view(User $user, __ENTITY__ $model): bool
    {
        //
    }

    /**
     * Determine whether the user can create models.
     */
    public function create(User $user): bool
    {
        //
    }
}
"#;

const FACTORY: &str = r#"<?php

namespace Database\Factories;

use Illuminate\Database\Eloquent\Factories\Factory;

/**
 * @extends \Illuminate\Database\Eloquent\Factories\Factory<\App\Models\__ENTITY__>
 */
class __ENTITY__Factory extends Factory
{
    /**
     * Define the model's default state.
     *
     * @return array<string, mixed>
     */
    public function definition(): array
    {
        return [
            //
        ];
    }
}
"#;

const SEEDER: &str = r#"<?php

namespace Database\Seeders;

use Illuminate\Database\Console\Seeds\WithoutModelEvents;
use Illuminate\Database\Seeder;

class __ENTITY__Seeder extends Seeder
{
    /**
     * Run the database seeds.
     */
    public function run(): void
    {
        //
    }
}
"#;
